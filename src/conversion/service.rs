use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::conversion::model::{Conversion, ConversionResult};
use crate::error::AppError;
use crate::rates::service::RateFetcher;
use crate::utils::math::{is_positive_amount, round_to};

#[derive(Clone)]
pub struct ConversionService {
    fetcher: Arc<dyn RateFetcher>,
}

impl ConversionService {
    pub fn new(fetcher: Arc<dyn RateFetcher>) -> Self {
        Self { fetcher }
    }

    /// Converts `amount` (1 when absent) from one currency to another.
    ///
    /// Identical currencies are answered without asking the rate provider.
    /// The reported rate is derived from the rounded converted amount, so it
    /// can differ from the provider's rate in the fifth decimal place.
    #[instrument(skip(self))]
    pub async fn convert(
        &self,
        amount: Option<f64>,
        from_currency: &str,
        to_currency: &str,
    ) -> ConversionResult {
        let from_currency = normalize_code(from_currency);
        let to_currency = normalize_code(to_currency);

        if from_currency.is_empty() || to_currency.is_empty() {
            return Err(AppError::ValidationError(
                "missing currency: both from and to currencies are required".to_string(),
            ));
        }

        let amount = match amount {
            Some(amount) if !is_positive_amount(amount) => {
                return Err(AppError::ValidationError(
                    "amount must be a positive number".to_string(),
                ))
            }
            Some(amount) => amount,
            None => 1.0,
        };

        if from_currency == to_currency {
            debug!("Same currency, skipping rate lookup");
            return Ok(Conversion {
                original_amount: amount,
                from_currency,
                to_currency,
                converted_amount: amount,
                rate: 1.0,
                market_rate: 1.0,
                date: None,
                timestamp: Utc::now(),
            });
        }

        let table = self.fetcher.fetch_rates(&from_currency).await?;
        let raw_rate = table
            .rate(&to_currency)
            .ok_or_else(|| AppError::UnknownCurrency(to_currency.clone()))?;

        let product = amount * raw_rate;
        if !product.is_finite() {
            return Err(AppError::ValidationError(format!(
                "amount {} is too large to convert from {} to {}",
                amount, from_currency, to_currency
            )));
        }

        let converted_amount = round_to(product, 2);
        let rate = round_to(converted_amount / amount, 4);

        Ok(Conversion {
            original_amount: amount,
            from_currency,
            to_currency,
            converted_amount,
            rate,
            market_rate: raw_rate,
            date: table.date,
            timestamp: Utc::now(),
        })
    }

    /// Every currency quoted against `base`, plus `base` itself, sorted.
    #[instrument(skip(self))]
    pub async fn list_currencies(&self, base: &str) -> Result<Vec<String>, AppError> {
        let base = normalize_code(base);
        if base.is_empty() {
            return Err(AppError::ValidationError(
                "base currency must not be empty".to_string(),
            ));
        }

        let table = self.fetcher.fetch_rates(&base).await?;

        let mut currencies: BTreeSet<String> = table.rates.into_keys().collect();
        currencies.insert(table.base);
        currencies.insert(base);

        Ok(currencies.into_iter().collect())
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    // Serves a fixed document and records every base it was asked for
    struct FakeFetcher {
        response: Result<Value, String>,
        calls: AtomicUsize,
        bases: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn with_document(document: Value) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(document),
                calls: AtomicUsize::new(0),
                bases: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Err(message.to_string()),
                calls: AtomicUsize::new(0),
                bases: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateFetcher for FakeFetcher {
        async fn fetch_document(&self, base: &str) -> Result<Value, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bases.lock().unwrap().push(base.to_string());
            self.response.clone().map_err(AppError::Upstream)
        }
    }

    fn service_with(fetcher: Arc<FakeFetcher>) -> ConversionService {
        ConversionService::new(fetcher)
    }

    #[tokio::test]
    async fn converts_known_pair() {
        let fetcher = FakeFetcher::with_document(json!({ "rates": { "EUR": 0.9 } }));
        let service = service_with(fetcher.clone());

        let conversion = service.convert(Some(100.0), "USD", "EUR").await.unwrap();
        assert_eq!(conversion.converted_amount, 90.0);
        assert_eq!(conversion.rate, 0.9);
        assert_eq!(conversion.original_amount, 100.0);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(*fetcher.bases.lock().unwrap(), vec!["USD".to_string()]);
    }

    #[tokio::test]
    async fn normalizes_codes_before_fetching() {
        let fetcher = FakeFetcher::with_document(json!({ "rates": { "EUR": 0.9 } }));
        let service = service_with(fetcher.clone());

        let conversion = service.convert(None, " usd", "eur ").await.unwrap();
        assert_eq!(conversion.from_currency, "USD");
        assert_eq!(conversion.to_currency, "EUR");
        assert_eq!(conversion.original_amount, 1.0);
        assert_eq!(conversion.converted_amount, 0.9);
        assert_eq!(*fetcher.bases.lock().unwrap(), vec!["USD".to_string()]);
    }

    #[tokio::test]
    async fn rate_is_derived_from_rounded_amount() {
        let fetcher = FakeFetcher::with_document(json!({ "rates": { "JPY": 0.123456 } }));
        let service = service_with(fetcher);

        let conversion = service.convert(Some(3.0), "USD", "JPY").await.unwrap();
        // 3 * 0.123456 = 0.370368 -> 0.37; 0.37 / 3 = 0.12333.. -> 0.1233
        assert_eq!(conversion.converted_amount, 0.37);
        assert_eq!(conversion.rate, 0.1233);
    }

    #[tokio::test]
    async fn keeps_provider_rate_for_small_rates() {
        let fetcher = FakeFetcher::with_document(json!({ "rates": { "USD": 0.0000625 } }));
        let service = service_with(fetcher);

        let conversion = service.convert(None, "IDR", "USD").await.unwrap();
        assert_eq!(conversion.converted_amount, 0.0);
        assert_eq!(conversion.rate, 0.0);
        assert_eq!(conversion.market_rate, 0.0000625);
    }

    #[tokio::test]
    async fn rejects_amounts_that_overflow() {
        let fetcher = FakeFetcher::with_document(json!({ "rates": { "EUR": 0.9, "JPY": 155.2 } }));
        let service = service_with(fetcher);

        let conversion = service.convert(Some(1e307), "USD", "EUR").await.unwrap();
        assert!(conversion.converted_amount.is_finite());
        assert!(conversion.rate.is_finite());

        let err = service.convert(Some(1e307), "USD", "JPY").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m.contains("too large")));
    }

    #[tokio::test]
    async fn same_currency_never_calls_fetcher() {
        let fetcher = FakeFetcher::failing("should not be called");
        let service = service_with(fetcher.clone());

        for amount in [Some(1.0), Some(42.125), Some(1e9), None] {
            let conversion = service.convert(amount, "usd", "USD").await.unwrap();
            assert_eq!(conversion.rate, 1.0);
            assert_eq!(conversion.market_rate, 1.0);
            assert_eq!(conversion.converted_amount, amount.unwrap_or(1.0));
            assert_eq!(conversion.original_amount, amount.unwrap_or(1.0));
        }
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn rejects_missing_currencies() {
        let fetcher = FakeFetcher::with_document(json!({ "rates": {} }));
        let service = service_with(fetcher.clone());

        for (from, to) in [("", "EUR"), ("USD", ""), ("   ", "EUR")] {
            let err = service.convert(Some(1.0), from, to).await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(ref m) if m.contains("missing currency")));
        }
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn rejects_non_positive_amounts() {
        let fetcher = FakeFetcher::with_document(json!({ "rates": { "EUR": 0.9 } }));
        let service = service_with(fetcher.clone());

        for amount in [0.0, -1.0, -0.01, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_err!(service.convert(Some(amount), "USD", "EUR").await);
            assert_err!(service.convert(Some(amount), "USD", "USD").await);
        }
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_target_currency() {
        let fetcher = FakeFetcher::with_document(json!({ "rates": { "EUR": 0.9 } }));
        let service = service_with(fetcher);

        let err = service.convert(Some(5.0), "USD", "ZZZ").await.unwrap_err();
        assert!(matches!(err, AppError::UnknownCurrency(ref code) if code == "ZZZ"));
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let fetcher = FakeFetcher::failing("connection refused");
        let service = service_with(fetcher.clone());

        let err = service.convert(Some(5.0), "USD", "EUR").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref m) if m == "connection refused"));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_document_propagates() {
        let fetcher = FakeFetcher::with_document(json!({ "base": "USD" }));
        let service = service_with(fetcher);

        let err = service.convert(Some(5.0), "USD", "EUR").await.unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn currencies_are_sorted_unique_and_include_base() {
        let fetcher = FakeFetcher::with_document(json!({
            "base": "USD",
            "rates": { "GBP": 0.8, "eur": 0.9, "EUR": 0.9, "AUD": 1.5 }
        }));
        let service = service_with(fetcher);

        let currencies = assert_ok!(service.list_currencies("usd").await);
        assert_eq!(currencies, vec!["AUD", "EUR", "GBP", "USD"]);
    }
}
