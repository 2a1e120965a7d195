use std::sync::Arc;

use axum::{routing::get, Router};

use crate::rates::{handler, service::RateFetcher};

#[derive(Clone)]
pub struct RatesState {
  pub fetcher: Arc<dyn RateFetcher>,
  pub default_base: String,
}

pub fn rates_routes(fetcher: Arc<dyn RateFetcher>, default_base: String) -> Router {
  let state = RatesState {
      fetcher,
      default_base,
  };

  Router::new()
      .route("/rates", get(handler::get_rates))
      .with_state(state)
}
