use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::warn;

use crate::redis::{ClientMode, RedisUtilError};

/// API錯誤，以純文字響應
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Redis {0} 模式未配置")]
    Unavailable(ClientMode),

    #[error("鍵不存在: {0}")]
    NotFound(String),

    #[error("Redis操作失敗: {0}")]
    Redis(#[from] RedisUtilError),

    #[error("Redis操作失敗: {0}")]
    Failed(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Redis(_) | ApiError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), "{}", self);
        }
        (status, self.to_string()).into_response()
    }
}
