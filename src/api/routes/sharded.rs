use axum::{routing::get, Router};

use crate::api::handlers::sharded;
use crate::api::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sharded/set", get(sharded::set))
        .route("/sharded/get", get(sharded::get))
        .route("/sharded/set2", get(sharded::set2))
        .route("/sharded/get2", get(sharded::get2))
}
