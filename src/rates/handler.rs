use axum::{
  extract::{Query, State},
  Json,
};
use serde_json::Value;
use tracing::warn;

use crate::{
  error::AppError,
  rates::{model::RatesQuery, routes::RatesState},
};

// Pass the provider's document through untouched
pub async fn get_rates(
  State(state): State<RatesState>,
  Query(query): Query<RatesQuery>,
) -> Result<Json<Value>, AppError> {
  let base = query
      .base
      .map(|base| base.trim().to_uppercase())
      .filter(|base| !base.is_empty())
      .unwrap_or_else(|| state.default_base.clone());

  match state.fetcher.fetch_document(&base).await {
      Ok(document) => Ok(Json(document)),
      Err(e) => {
          warn!(%base, error = %e, "Failed to fetch rates");
          Err(e)
      }
  }
}
