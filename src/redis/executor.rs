//! 受管理的 Redis 操作執行器
//!
//! 每次執行都會從連接池取出一個連接，以該連接呼叫操作一次，
//! 然後無論成功、失敗或 panic 都歸還連接。超時的連接狀態不明，
//! 直接移出連接池。

use super::pool::{RedisPool, RedisPoolError};
use async_trait::async_trait;
use deadpool_redis::redis::{RedisError, RedisResult};
use futures::future::BoxFuture;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Redis操作錯誤
#[derive(Error, Debug)]
pub enum RedisUtilError {
    /// 等待超過 max-wait 仍無可用連接
    #[error("Redis連接池已耗盡: {0}")]
    PoolExhausted(String),

    /// 無法取得連接
    #[error("無法獲取Redis連接: {0}")]
    Connection(String),

    /// 伺服器返回錯誤或連接中斷
    #[error("Redis命令錯誤: {0}")]
    Remote(#[from] RedisError),

    /// 命令超過時間上限
    #[error("Redis命令超時 ({}ms)", .0.as_millis())]
    Timeout(Duration),

    /// 參數不合法，未發出任何命令
    #[error("無效參數: {0}")]
    InvalidArgument(String),
}

impl From<RedisPoolError> for RedisUtilError {
    fn from(error: RedisPoolError) -> Self {
        match error {
            RedisPoolError::Exhausted(reason) => RedisUtilError::PoolExhausted(reason),
            other => RedisUtilError::Connection(other.to_string()),
        }
    }
}

/// 回呼物件形式的操作
#[async_trait]
pub trait RedisCallback<C: Send>: Send + Sync {
    type Output: Send;

    async fn call(&self, conn: &mut C) -> RedisResult<Self::Output>;
}

/// 受管理的執行器
#[derive(Clone)]
pub struct Executor<P: RedisPool> {
    pool: P,
    command_timeout: Duration,
}

impl<P: RedisPool> Executor<P> {
    pub fn new(pool: P, command_timeout: Duration) -> Self {
        Self {
            pool,
            command_timeout,
        }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// 執行操作，失敗時記錄日誌並返回 `None`
    pub async fn execute<R, F>(&self, name: &str, operation: F) -> Option<R>
    where
        R: Send,
        F: for<'c> FnOnce(&'c mut P::Connection) -> BoxFuture<'c, RedisResult<R>> + Send,
    {
        Self::sentinel(name, self.try_execute(operation).await)
    }

    /// 阻塞命令用，時間上限為命令超時加上阻塞時間
    pub async fn execute_blocking<R, F>(&self, name: &str, blocking: Duration, operation: F) -> Option<R>
    where
        R: Send,
        F: for<'c> FnOnce(&'c mut P::Connection) -> BoxFuture<'c, RedisResult<R>> + Send,
    {
        Self::sentinel(name, self.try_execute_within(blocking, operation).await)
    }

    /// 以回呼物件執行，失敗時記錄日誌並返回 `None`
    pub async fn execute_callback<T>(&self, name: &str, callback: &T) -> Option<T::Output>
    where
        T: RedisCallback<P::Connection> + ?Sized,
    {
        Self::sentinel(name, self.try_execute_callback(callback).await)
    }

    /// 執行操作並返回失敗原因，不記錄日誌
    pub async fn try_execute<R, F>(&self, operation: F) -> Result<R, RedisUtilError>
    where
        R: Send,
        F: for<'c> FnOnce(&'c mut P::Connection) -> BoxFuture<'c, RedisResult<R>> + Send,
    {
        self.try_execute_within(Duration::ZERO, operation).await
    }

    pub async fn try_execute_within<R, F>(
        &self,
        blocking: Duration,
        operation: F,
    ) -> Result<R, RedisUtilError>
    where
        R: Send,
        F: for<'c> FnOnce(&'c mut P::Connection) -> BoxFuture<'c, RedisResult<R>> + Send,
    {
        let budget = self.command_timeout + blocking;
        let mut conn = self.pool.get_conn().await?;
        let result = tokio::time::timeout(budget, operation(&mut conn)).await;
        self.settle(conn, result, budget)
    }

    /// 以回呼物件執行並返回失敗原因
    pub async fn try_execute_callback<T>(&self, callback: &T) -> Result<T::Output, RedisUtilError>
    where
        T: RedisCallback<P::Connection> + ?Sized,
    {
        let budget = self.command_timeout;
        let mut conn = self.pool.get_conn().await?;
        let result = tokio::time::timeout(budget, callback.call(&mut conn)).await;
        self.settle(conn, result, budget)
    }

    /// 有回覆時歸還連接；超時時伺服器端可能仍在執行命令，連接不再重用
    fn settle<R>(
        &self,
        conn: P::Connection,
        result: Result<RedisResult<R>, tokio::time::error::Elapsed>,
        budget: Duration,
    ) -> Result<R, RedisUtilError> {
        match result {
            Ok(reply) => {
                drop(conn);
                self.pool.trim_idle();
                debug!("Redis連接已歸還連接池");
                reply.map_err(RedisUtilError::from)
            }
            Err(_) => {
                self.pool.discard(conn);
                warn!(timeout_ms = budget.as_millis() as u64, "Redis命令超時，已丟棄連接");
                Err(RedisUtilError::Timeout(budget))
            }
        }
    }

    fn sentinel<R>(name: &str, result: Result<R, RedisUtilError>) -> Option<R> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                error!(operation = name, error = %e, "Redis操作失敗");
                None
            }
        }
    }
}
