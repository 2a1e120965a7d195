use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

// Result of a successful conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub original_amount: f64,
    pub from_currency: String,
    pub to_currency: String,
    pub converted_amount: f64,
    pub rate: f64,
    /// Provider rate for one unit, before any rounding.
    #[serde(skip)]
    pub market_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Either a conversion or the reason it failed, never both.
pub type ConversionResult = Result<Conversion, AppError>;

// JSON conversion request
#[derive(Debug, Deserialize, Validate)]
pub struct ConvertRequest {
    #[serde(default)]
    pub amount: Option<AmountInput>,
    #[serde(default)]
    #[validate(length(min = 1, message = "from_currency is required"))]
    pub from_currency: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "to_currency is required"))]
    pub to_currency: String,
}

/// Amounts arrive either as JSON numbers or as numeric strings from form posts.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub fn parse(&self) -> Result<f64, AppError> {
        match self {
            AmountInput::Number(value) => Ok(*value),
            AmountInput::Text(text) => parse_amount(text),
        }
    }
}

pub fn parse_amount(text: &str) -> Result<f64, AppError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| AppError::ValidationError(format!("amount '{}' is not a number", text.trim())))
}

// Query string of the HTML converter page
#[derive(Debug, Default, Deserialize)]
pub struct ConvertQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    #[serde(flatten)]
    pub conversion: Conversion,
}

#[derive(Debug, Serialize)]
pub struct CurrenciesResponse {
    pub currencies: Vec<String>,
}
