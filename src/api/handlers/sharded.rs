//! 分片模式示範接口
//!
//! `set` / `get` 使用回呼物件形式，`set2` / `get2` 使用鍵值門面。

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use deadpool_redis::redis::{AsyncCommands, RedisResult};

use super::KeyValueQuery;
use crate::api::{ApiError, AppState};
use crate::redis::{ClientMode, RedisCallback, RedisConnection};

const DEMO_KEY: &str = "sharded:demo";
const DEMO_VALUE: &str = "hello sharded";

struct SetValue {
    key: String,
    value: String,
}

#[async_trait]
impl RedisCallback<RedisConnection> for SetValue {
    type Output = ();

    async fn call(&self, conn: &mut RedisConnection) -> RedisResult<()> {
        conn.set(&self.key, &self.value).await
    }
}

struct GetValue {
    key: String,
}

#[async_trait]
impl RedisCallback<RedisConnection> for GetValue {
    type Output = Option<String>;

    async fn call(&self, conn: &mut RedisConnection) -> RedisResult<Option<String>> {
        conn.get(&self.key).await
    }
}

pub async fn set(
    State(state): State<AppState>,
    Query(query): Query<KeyValueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let executor = state.util(ClientMode::Sharded)?.executor();
    let callback = SetValue {
        key: query.key_or(DEMO_KEY),
        value: query.value_or(DEMO_VALUE),
    };

    executor.try_execute_callback(&callback).await?;
    Ok("OK")
}

pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<KeyValueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let executor = state.util(ClientMode::Sharded)?.executor();
    let callback = GetValue {
        key: query.key_or(DEMO_KEY),
    };

    executor
        .try_execute_callback(&callback)
        .await?
        .ok_or(ApiError::NotFound(callback.key))
}

pub async fn set2(
    State(state): State<AppState>,
    Query(query): Query<KeyValueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let util = state.util(ClientMode::Sharded)?;
    let key = query.key_or(DEMO_KEY);

    if util.set(&key, &query.value_or(DEMO_VALUE)).await {
        Ok("OK")
    } else {
        Err(ApiError::Failed(format!("set {}", key)))
    }
}

pub async fn get2(
    State(state): State<AppState>,
    Query(query): Query<KeyValueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let util = state.util(ClientMode::Sharded)?;
    let key = query.key_or(DEMO_KEY);

    util.get(&key).await.ok_or(ApiError::NotFound(key))
}
