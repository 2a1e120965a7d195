use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Rates for every quoted currency against a single base currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    pub base: String,
    pub date: Option<String>,
    pub rates: BTreeMap<String, f64>,
}

// Fields shared by the common public rate APIs (exchangerate-api v4,
// open.er-api v6, exchangerate.host). Only `rates` is required.
#[derive(Debug, Deserialize)]
struct RatesDocument {
    base: Option<String>,
    base_code: Option<String>,
    date: Option<String>,
    time_last_update_utc: Option<String>,
    rates: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    pub base: Option<String>,
}

impl RateTable {
    /// Checks an upstream document against the expected schema.
    pub fn from_document(requested_base: &str, document: Value) -> Result<Self, AppError> {
        if let Some(message) = upstream_error_message(&document) {
            return Err(AppError::Upstream(message));
        }

        let parsed: RatesDocument = serde_json::from_value(document).map_err(|e| {
            AppError::MalformedResponse(format!("unexpected rate document shape: {}", e))
        })?;

        let rates = parsed.rates.ok_or_else(|| {
            AppError::MalformedResponse("response has no `rates` field".to_string())
        })?;

        let base = parsed
            .base
            .or(parsed.base_code)
            .unwrap_or_else(|| requested_base.to_string())
            .to_uppercase();

        Ok(Self {
            base,
            date: parsed.date.or(parsed.time_last_update_utc),
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.to_uppercase(), rate))
                .collect(),
        })
    }

    pub fn rate(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }
}

/// Extracts the failure reason from a document the provider flagged as an error.
pub fn upstream_error_message(document: &Value) -> Option<String> {
    let failed = document.get("success").and_then(Value::as_bool) == Some(false)
        || document.get("result").and_then(Value::as_str) == Some("error");
    if !failed {
        return None;
    }

    let detail = document
        .get("error-type")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| match document.get("error") {
            Some(Value::String(message)) => Some(message.clone()),
            Some(Value::Object(error)) => error
                .get("info")
                .or_else(|| error.get("message"))
                .or_else(|| error.get("type"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| "Unknown error".to_string());

    Some(format!("Conversion error: {}", detail))
}
