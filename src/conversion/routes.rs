use axum::{routing::get, Router};

use crate::conversion::{handler, service::ConversionService};

#[derive(Clone)]
pub struct ConversionState {
  pub service: ConversionService,
  pub currencies_base: String,
}

pub fn conversion_routes(service: ConversionService, currencies_base: String) -> Router {
  let state = ConversionState {
      service,
      currencies_base,
  };

  Router::new()
      .route("/", get(handler::index))
      // HTML form submits with GET, the JSON API posts
      .route("/convert", get(handler::convert_page).post(handler::convert_json))
      .route("/currencies", get(handler::list_currencies))
      .with_state(state)
}
