//! Redis操作模組
//!
//! [`RedisUtil`] 以受管理的執行器封裝常用的 Redis 命令。
//! 失敗時記錄日誌並返回哨兵值（`None` / `false` / `0`）；
//! 需要知道失敗原因的呼叫方可使用 `fetch` 或直接使用 [`Executor`]。

pub mod hashes;
pub mod keys;
pub mod lists;
pub mod sorted_sets;
pub mod strings;

use crate::config::types::RedisSettings;
use crate::redis::client::RedisClient;
use crate::redis::executor::{Executor, RedisUtilError};
use crate::redis::pool::RedisPool;
use deadpool_redis::redis::{AsyncCommands, RedisResult};
use std::time::Duration;

/// 帶標記的查詢結果
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Failed(RedisUtilError),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Lookup::Failed(_))
    }
}

impl<T> From<Result<Option<T>, RedisUtilError>> for Lookup<T> {
    fn from(result: Result<Option<T>, RedisUtilError>) -> Self {
        match result {
            Ok(Some(value)) => Lookup::Found(value),
            Ok(None) => Lookup::NotFound,
            Err(e) => Lookup::Failed(e),
        }
    }
}

/// Redis 鍵值操作門面
#[derive(Clone)]
pub struct RedisUtil<P: RedisPool = RedisClient> {
    executor: Executor<P>,
}

impl<P: RedisPool> RedisUtil<P> {
    pub fn new(pool: P, command_timeout: Duration) -> Self {
        Self {
            executor: Executor::new(pool, command_timeout),
        }
    }

    /// 以配置中的命令超時建立
    pub fn with_settings(pool: P, settings: &RedisSettings) -> Self {
        Self::new(pool, settings.timeout())
    }

    pub fn executor(&self) -> &Executor<P> {
        &self.executor
    }
}

/// ttl 大於 0 時設置過期時間
pub(crate) async fn apply_ttl<C>(conn: &mut C, key: &str, ttl: i64) -> RedisResult<()>
where
    C: deadpool_redis::redis::aio::ConnectionLike + Send + Sync,
{
    if ttl > 0 {
        let _: bool = conn.expire(key, ttl).await?;
    }
    Ok(())
}

/// 增量必須為正數
pub(crate) fn positive_delta(delta: i64) -> Result<i64, RedisUtilError> {
    if delta > 0 {
        Ok(delta)
    } else {
        Err(RedisUtilError::InvalidArgument(format!(
            "遞增因子必須大於0, 實際為 {}",
            delta
        )))
    }
}
