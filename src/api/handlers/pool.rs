//! 單機模式示範接口，直接以閉包形式使用執行器

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use deadpool_redis::redis::AsyncCommands;

use super::KeyValueQuery;
use crate::api::{ApiError, AppState};
use crate::redis::ClientMode;

const DEMO_KEY: &str = "pool:demo";
const DEMO_VALUE: &str = "hello pool";

pub async fn set(
    State(state): State<AppState>,
    Query(query): Query<KeyValueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let executor = state.util(ClientMode::Single)?.executor();
    let key = query.key_or(DEMO_KEY);
    let value = query.value_or(DEMO_VALUE);

    executor
        .try_execute(move |conn| Box::pin(async move { conn.set::<_, _, ()>(&key, &value).await }))
        .await?;
    Ok("OK")
}

pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<KeyValueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let executor = state.util(ClientMode::Single)?.executor();
    let key = query.key_or(DEMO_KEY);

    let lookup = key.clone();
    let value = executor
        .try_execute(move |conn| {
            Box::pin(async move { conn.get::<_, Option<String>>(&lookup).await })
        })
        .await?;
    value.ok_or(ApiError::NotFound(key))
}
