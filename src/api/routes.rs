use axum::Router;

use crate::api::AppState;

pub mod cluster;
pub mod pool;
pub mod sharded;
pub mod system;

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .merge(system::routes())
        .merge(cluster::routes())
        .merge(pool::routes())
        .merge(sharded::routes())
        .with_state(state)
}
