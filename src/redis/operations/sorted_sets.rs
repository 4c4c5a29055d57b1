//! 有序集合操作

use super::{apply_ttl, RedisUtil};
use crate::redis::pool::RedisPool;
use deadpool_redis::redis::AsyncCommands;

impl<P: RedisPool> RedisUtil<P> {
    /// 返回新增的成員數，失敗時為 0
    pub async fn zadd(&self, key: &str, member: &str, score: f64) -> i64 {
        self.zadd_multiple_with_ttl(key, &[(score, member)], 0).await
    }

    pub async fn zadd_with_ttl(&self, key: &str, member: &str, score: f64, ttl: i64) -> i64 {
        self.zadd_multiple_with_ttl(key, &[(score, member)], ttl).await
    }

    /// 批量新增 `(score, member)`
    pub async fn zadd_multiple(&self, key: &str, items: &[(f64, &str)]) -> i64 {
        self.zadd_multiple_with_ttl(key, items, 0).await
    }

    pub async fn zadd_multiple_with_ttl(&self, key: &str, items: &[(f64, &str)], ttl: i64) -> i64 {
        if items.is_empty() {
            return 0;
        }
        let key = key.to_owned();
        let items: Vec<(f64, String)> = items.iter().map(|(s, m)| (*s, m.to_string())).collect();
        self.executor
            .execute("zadd", move |conn| {
                Box::pin(async move {
                    let added: i64 = conn.zadd_multiple(&key, &items[..]).await?;
                    apply_ttl(conn, &key, ttl).await?;
                    Ok(added)
                })
            })
            .await
            .unwrap_or(0)
    }

    /// 返回移除的成員數，失敗時為 0
    pub async fn zrem(&self, key: &str, members: &[&str]) -> i64 {
        if members.is_empty() {
            return 0;
        }
        let key = key.to_owned();
        let members: Vec<String> = members.iter().map(|m| m.to_string()).collect();
        self.executor
            .execute("zrem", move |conn| {
                Box::pin(async move { conn.zrem::<_, _, i64>(&key, &members).await })
            })
            .await
            .unwrap_or(0)
    }
}
