//! 鍵管理操作

use super::RedisUtil;
use crate::redis::executor::RedisUtilError;
use crate::redis::pool::RedisPool;
use deadpool_redis::redis::AsyncCommands;
use tracing::debug;

impl<P: RedisPool> RedisUtil<P> {
    /// 設置過期時間，命令成功發出即返回 `true`（鍵不存在亦然）
    ///
    /// `ttl <= 0` 時不發出命令並返回 `true`。
    pub async fn expire(&self, key: &str, ttl: i64) -> bool {
        if ttl <= 0 {
            debug!(key, ttl, "ttl 不大於0，不設置過期時間");
            return true;
        }
        let key = key.to_owned();
        self.executor
            .execute("expire", move |conn| {
                Box::pin(async move { conn.expire::<_, bool>(&key, ttl).await })
            })
            .await
            .is_some()
    }

    /// 設置過期時間並返回鍵是否存在
    pub async fn try_expire(&self, key: &str, ttl: i64) -> Result<bool, RedisUtilError> {
        if ttl <= 0 {
            return Ok(true);
        }
        let key = key.to_owned();
        self.executor
            .try_execute(move |conn| {
                Box::pin(async move { conn.expire::<_, bool>(&key, ttl).await })
            })
            .await
    }

    pub async fn exists(&self, key: &str) -> bool {
        let key = key.to_owned();
        self.executor
            .execute("exists", move |conn| {
                Box::pin(async move { conn.exists::<_, bool>(&key).await })
            })
            .await
            .unwrap_or(false)
    }

    /// 刪除鍵，失敗只記錄日誌
    pub async fn del(&self, key: &str) {
        let key = key.to_owned();
        self.executor
            .execute("del", move |conn| {
                Box::pin(async move { conn.del::<_, i64>(&key).await })
            })
            .await;
    }

    /// 在同一個連接上逐個刪除，集群與分片模式下鍵可位於不同節點
    pub async fn del_many(&self, keys: &[&str]) {
        if keys.is_empty() {
            return;
        }
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.executor
            .execute("del_many", move |conn| {
                Box::pin(async move {
                    let mut removed = 0i64;
                    for key in &keys {
                        removed += conn.del::<_, i64>(key).await?;
                    }
                    Ok(removed)
                })
            })
            .await;
    }
}
