//! 集群模式示範接口，透過鍵值門面讀寫

use std::collections::HashMap;

use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::KeyValueQuery;
use crate::api::{ApiError, AppState};
use crate::redis::{ClientMode, Lookup};

const DEMO_KEY: &str = "cluster:demo";
const DEMO_VALUE: &str = "hello cluster";
const DEMO_USER_KEY: &str = "cluster:user:1";

/// 以雜湊儲存的示範用戶
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn demo() -> Self {
        Self {
            id: 1,
            name: "redis-starter".to_string(),
            email: "starter@example.com".to_string(),
            created_at: Utc::now(),
        }
    }

    /// 轉為雜湊欄位
    pub fn to_fields(&self) -> HashMap<String, String> {
        HashMap::from([
            ("id".to_string(), self.id.to_string()),
            ("name".to_string(), self.name.clone()),
            ("email".to_string(), self.email.clone()),
            ("created_at".to_string(), self.created_at.to_rfc3339()),
        ])
    }
}

pub async fn set(
    State(state): State<AppState>,
    Query(query): Query<KeyValueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let util = state.util(ClientMode::Cluster)?;
    let key = query.key_or(DEMO_KEY);

    if util.set(&key, &query.value_or(DEMO_VALUE)).await {
        info!(key, "集群寫入成功");
        Ok("OK")
    } else {
        Err(ApiError::Failed(format!("set {}", key)))
    }
}

pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<KeyValueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let util = state.util(ClientMode::Cluster)?;
    let key = query.key_or(DEMO_KEY);

    match util.fetch(&key).await {
        Lookup::Found(value) => Ok(value),
        Lookup::NotFound => Err(ApiError::NotFound(key)),
        Lookup::Failed(e) => Err(e.into()),
    }
}

pub async fn hmset(
    State(state): State<AppState>,
    Query(query): Query<KeyValueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let util = state.util(ClientMode::Cluster)?;
    let key = query.key_or(DEMO_USER_KEY);
    let fields = UserRecord::demo().to_fields();

    if util.hmset(&key, &fields).await {
        Ok(Json(fields))
    } else {
        Err(ApiError::Failed(format!("hmset {}", key)))
    }
}

pub async fn hmget(
    State(state): State<AppState>,
    Query(query): Query<KeyValueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let util = state.util(ClientMode::Cluster)?;
    let key = query.key_or(DEMO_USER_KEY);

    match util.hgetall(&key).await {
        Some(fields) if fields.is_empty() => Err(ApiError::NotFound(key)),
        Some(fields) => Ok(Json(fields)),
        None => Err(ApiError::Failed(format!("hgetall {}", key))),
    }
}
