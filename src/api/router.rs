use std::sync::Arc;

use axum::{
  error_handling::HandleErrorLayer,
  http::StatusCode,
  routing::get,
  BoxError, Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
  compression::CompressionLayer,
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{
  config::Config,
  conversion::{routes::conversion_routes, service::ConversionService},
  error::AppError,
  rates::{
      routes::rates_routes,
      service::{HttpRateFetcher, RateFetcher},
  },
};

pub fn create_router(config: &Config) -> Result<Router, AppError> {
  // Setup rate provider client
  let fetcher = HttpRateFetcher::new(&config.rates_api_url, config.rates_timeout)?;

  Ok(create_router_with_fetcher(config, Arc::new(fetcher)))
}

pub fn create_router_with_fetcher(config: &Config, fetcher: Arc<dyn RateFetcher>) -> Router {
  // Setup CORS
  let cors = CorsLayer::new()
      .allow_origin(Any)
      .allow_methods(Any)
      .allow_headers(Any);

  // Setup services
  let conversion_service = ConversionService::new(fetcher.clone());

  // Build the router
  Router::new()
      .route("/health", get(health_check))
      .merge(conversion_routes(conversion_service, config.currencies_base.clone()))
      .merge(rates_routes(fetcher, config.currencies_base.clone()))
      .layer(
          ServiceBuilder::new()
              .layer(HandleErrorLayer::new(handle_timeout_error))
              .timeout(config.request_timeout),
      )
      .layer(TraceLayer::new_for_http())
      .layer(CompressionLayer::new())
      .layer(cors)
}

async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
  (
      StatusCode::OK,
      Json(json!({
          "status": "success",
          "message": "Server is running"
      })),
  )
}

async fn handle_timeout_error(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
  let (status, message) = if err.is::<tower::timeout::error::Elapsed>() {
      (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string())
  } else {
      (
          StatusCode::INTERNAL_SERVER_ERROR,
          format!("Unhandled internal error: {}", err),
      )
  };

  (
      status,
      Json(json!({
          "success": false,
          "error": message,
      })),
  )
}
