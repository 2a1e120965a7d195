use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
  #[error("Validation error: {0}")]
  ValidationError(String),

  #[error("Unknown currency: {0}")]
  UnknownCurrency(String),

  #[error("Rate provider error: {0}")]
  Upstream(String),

  #[error("Malformed rate provider response: {0}")]
  MalformedResponse(String),

  #[error("Config error: {0}")]
  ConfigError(String),

  #[error("Internal server error: {0}")]
  InternalError(String),
}

impl AppError {
  pub fn status_code(&self) -> StatusCode {
      match self {
          AppError::ValidationError(_) | AppError::UnknownCurrency(_) => StatusCode::BAD_REQUEST,
          AppError::Upstream(_)
          | AppError::MalformedResponse(_)
          | AppError::ConfigError(_)
          | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
      }
  }
}

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
      if err.is_timeout() {
          Self::Upstream("request to rate provider timed out".to_string())
      } else if err.is_decode() {
          Self::MalformedResponse(err.to_string())
      } else {
          Self::Upstream(err.to_string())
      }
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(err: validator::ValidationErrors) -> Self {
      Self::ValidationError(err.to_string())
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
      let status = self.status_code();
      let error_message = match &self {
          AppError::ConfigError(_) => "A configuration error occurred".to_string(),
          _ => self.to_string(),
      };

      let body = Json(json!({
          "success": false,
          "error": error_message,
      }));

      (status, body).into_response()
  }
}
