use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::AppError;
use crate::rates::model::{upstream_error_message, RateTable};

/// Source of exchange rates relative to a base currency.
///
/// Every call goes to the provider; nothing is cached between calls.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    /// Raw provider document for `base`.
    async fn fetch_document(&self, base: &str) -> Result<Value, AppError>;

    async fn fetch_rates(&self, base: &str) -> Result<RateTable, AppError> {
        let document = self.fetch_document(base).await?;
        RateTable::from_document(base, document)
    }
}

/// Fetches `{base_url}/latest/{BASE}` over HTTP.
#[derive(Clone)]
pub struct HttpRateFetcher {
    client: Client,
    base_url: Url,
}

impl HttpRateFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid rate API URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::ConfigError(format!(
                "Rate API URL {} cannot be used as a base",
                base_url
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("currency-converter/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn latest_url(&self, base: &str) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::ConfigError("Rate API URL cannot be used as a base".into()))?
            .pop_if_empty()
            .push("latest")
            .push(base);
        Ok(url)
    }
}

#[async_trait]
impl RateFetcher for HttpRateFetcher {
    #[instrument(name = "FetchRates", skip(self), fields(base = %base))]
    async fn fetch_document(&self, base: &str) -> Result<Value, AppError> {
        if base.trim().is_empty() {
            return Err(AppError::ValidationError(
                "base currency must not be empty".to_string(),
            ));
        }

        let url = self.latest_url(base)?;
        debug!(%url, "Requesting exchange rates");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "Rate provider request failed");
            AppError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(%status, "Rate provider returned an error status");
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|document| upstream_error_message(&document));
            return Err(AppError::Upstream(match detail {
                Some(detail) => format!("HTTP {} for base currency {}: {}", status, base, detail),
                None => format!("HTTP {} for base currency {}", status, base),
            }));
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, "Rate provider returned invalid JSON");
            AppError::MalformedResponse(format!("response for {} is not valid JSON: {}", base, e))
        })
    }
}
