pub mod api;
pub mod config;
pub mod conversion;
pub mod error;
pub mod rates;
pub mod utils;

// Re-export common modules
pub use api::router;
pub use config::Config;
pub use conversion::service::ConversionService;
pub use error::AppError;
pub use rates::service::{HttpRateFetcher, RateFetcher};
