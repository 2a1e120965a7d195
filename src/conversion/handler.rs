use axum::{
  extract::{rejection::JsonRejection, Query, State},
  response::Html,
  Json,
};
use tracing::{error, warn};
use validator::Validate;

use crate::{
  conversion::{
      model::{parse_amount, ConvertQuery, ConvertRequest, ConvertResponse, CurrenciesResponse},
      page::{self, FormValues, Outcome, MISSING_PARAMS_MESSAGE},
      routes::ConversionState,
  },
  error::AppError,
};

// Empty converter form
pub async fn index() -> Html<String> {
  Html(page::render(&FormValues::default(), None))
}

// HTML conversion; failures are rendered into the page, never as an error status
pub async fn convert_page(
  State(state): State<ConversionState>,
  query: Option<Query<ConvertQuery>>,
) -> Html<String> {
  let query = query.map(|Query(query)| query).unwrap_or_default();

  let from = query.from.unwrap_or_default().trim().to_uppercase();
  let to = query.to.unwrap_or_default().trim().to_uppercase();
  let amount_text = query.amount.unwrap_or_default().trim().to_string();

  let form = FormValues {
      from: from.clone(),
      to: to.clone(),
      amount: amount_text.clone(),
  };

  if from.is_empty() || to.is_empty() {
      return Html(page::render(&form, Some(Outcome::Failed(MISSING_PARAMS_MESSAGE))));
  }

  let amount = if amount_text.is_empty() {
      Ok(None)
  } else {
      parse_amount(&amount_text).map(Some)
  };

  let result = match amount {
      Ok(amount) => state.service.convert(amount, &from, &to).await,
      Err(e) => Err(e),
  };

  match result {
      Ok(conversion) => Html(page::render(&form, Some(Outcome::Converted(&conversion)))),
      Err(e) => {
          warn!(%from, %to, error = %e, "Conversion failed");
          let message = e.to_string();
          Html(page::render(&form, Some(Outcome::Failed(&message))))
      }
  }
}

// JSON conversion
pub async fn convert_json(
  State(state): State<ConversionState>,
  payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<ConvertResponse>, AppError> {
  let Json(req) = payload.map_err(|e| AppError::ValidationError(e.body_text()))?;

  // Validate request
  req.validate()?;

  let amount = req.amount.as_ref().map(|amount| amount.parse()).transpose()?;

  match state
      .service
      .convert(amount, &req.from_currency, &req.to_currency)
      .await
  {
      Ok(conversion) => Ok(Json(ConvertResponse {
          success: true,
          conversion,
      })),
      Err(e) => {
          if e.status_code().is_server_error() {
              error!(error = %e, "Conversion failed");
          } else {
              warn!(error = %e, "Conversion rejected");
          }
          Err(e)
      }
  }
}

// Currencies quoted against the configured base
pub async fn list_currencies(
  State(state): State<ConversionState>,
) -> Result<Json<CurrenciesResponse>, AppError> {
  let currencies = state
      .service
      .list_currencies(&state.currencies_base)
      .await
      .map_err(|e| {
          error!(error = %e, "Failed to list currencies");
          e
      })?;

  Ok(Json(CurrenciesResponse { currencies }))
}
