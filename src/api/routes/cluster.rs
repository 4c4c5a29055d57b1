use axum::{routing::get, Router};

use crate::api::handlers::cluster;
use crate::api::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cluster/set", get(cluster::set))
        .route("/cluster/get", get(cluster::get))
        .route("/cluster/hmset", get(cluster::hmset))
        .route("/cluster/hmget", get(cluster::hmget))
}
