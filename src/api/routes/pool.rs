use axum::{routing::get, Router};

use crate::api::handlers::pool;
use crate::api::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pool/set", get(pool::set))
        .route("/pool/get", get(pool::get))
}
