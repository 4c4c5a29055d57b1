//! 雜湊操作

use super::{apply_ttl, positive_delta, RedisUtil};
use crate::redis::executor::RedisUtilError;
use crate::redis::pool::RedisPool;
use deadpool_redis::redis::{cmd, AsyncCommands};
use std::collections::HashMap;
use tracing::warn;

impl<P: RedisPool> RedisUtil<P> {
    pub async fn hget(&self, key: &str, field: &str) -> Option<String> {
        let (key, field) = (key.to_owned(), field.to_owned());
        self.executor
            .execute("hget", move |conn| {
                Box::pin(async move { conn.hget::<_, _, Option<String>>(&key, &field).await })
            })
            .await
            .flatten()
    }

    /// 按欄位順序返回值，缺少的欄位為 `None`
    pub async fn hmget(&self, key: &str, fields: &[&str]) -> Option<Vec<Option<String>>> {
        if fields.is_empty() {
            return Some(Vec::new());
        }
        let key = key.to_owned();
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        self.executor
            .execute("hmget", move |conn| {
                Box::pin(async move {
                    cmd("HMGET")
                        .arg(&key)
                        .arg(&fields)
                        .query_async::<Vec<Option<String>>>(conn)
                        .await
                })
            })
            .await
    }

    pub async fn hgetall(&self, key: &str) -> Option<HashMap<String, String>> {
        let key = key.to_owned();
        self.executor
            .execute("hgetall", move |conn| {
                Box::pin(async move { conn.hgetall::<_, HashMap<String, String>>(&key).await })
            })
            .await
    }

    pub async fn hkeys(&self, key: &str) -> Option<Vec<String>> {
        let key = key.to_owned();
        self.executor
            .execute("hkeys", move |conn| {
                Box::pin(async move { conn.hkeys::<_, Vec<String>>(&key).await })
            })
            .await
    }

    /// 返回新增的欄位數，失敗時為 0
    pub async fn hset(&self, key: &str, field: &str, value: &str) -> i64 {
        self.hset_with_ttl(key, field, value, 0).await
    }

    pub async fn hset_with_ttl(&self, key: &str, field: &str, value: &str, ttl: i64) -> i64 {
        let (key, field, value) = (key.to_owned(), field.to_owned(), value.to_owned());
        self.executor
            .execute("hset", move |conn| {
                Box::pin(async move {
                    let added: i64 = conn.hset(&key, &field, &value).await?;
                    apply_ttl(conn, &key, ttl).await?;
                    Ok(added)
                })
            })
            .await
            .unwrap_or(0)
    }

    pub async fn hmset(&self, key: &str, values: &HashMap<String, String>) -> bool {
        self.hmset_with_ttl(key, values, 0).await
    }

    pub async fn hmset_with_ttl(&self, key: &str, values: &HashMap<String, String>, ttl: i64) -> bool {
        if values.is_empty() {
            warn!(key, "hmset 沒有任何欄位，忽略");
            return false;
        }
        let key = key.to_owned();
        let items: Vec<(String, String)> =
            values.iter().map(|(f, v)| (f.clone(), v.clone())).collect();
        self.executor
            .execute("hmset", move |conn| {
                Box::pin(async move {
                    conn.hset_multiple::<_, _, _, ()>(&key, &items[..]).await?;
                    apply_ttl(conn, &key, ttl).await
                })
            })
            .await
            .is_some()
    }

    /// 返回刪除的欄位數，失敗時為 0
    pub async fn hdel(&self, key: &str, fields: &[&str]) -> i64 {
        if fields.is_empty() {
            return 0;
        }
        let key = key.to_owned();
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        self.executor
            .execute("hdel", move |conn| {
                Box::pin(async move { conn.hdel::<_, _, i64>(&key, &fields).await })
            })
            .await
            .unwrap_or(0)
    }

    pub async fn hexists(&self, key: &str, field: &str) -> bool {
        let (key, field) = (key.to_owned(), field.to_owned());
        self.executor
            .execute("hexists", move |conn| {
                Box::pin(async move { conn.hexists::<_, _, bool>(&key, &field).await })
            })
            .await
            .unwrap_or(false)
    }

    pub async fn hincr(&self, key: &str, field: &str, delta: i64) -> Result<i64, RedisUtilError> {
        let delta = positive_delta(delta)?;
        self.hincr_by(key, field, delta).await
    }

    pub async fn hdecr(&self, key: &str, field: &str, delta: i64) -> Result<i64, RedisUtilError> {
        let delta = positive_delta(delta)?;
        self.hincr_by(key, field, -delta).await
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, RedisUtilError> {
        let (key, field) = (key.to_owned(), field.to_owned());
        self.executor
            .try_execute(move |conn| {
                Box::pin(async move { conn.hincr::<_, _, _, i64>(&key, &field, delta).await })
            })
            .await
    }
}
