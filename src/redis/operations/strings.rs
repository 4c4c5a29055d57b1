//! 字串操作

use super::{positive_delta, Lookup, RedisUtil};
use crate::redis::executor::RedisUtilError;
use crate::redis::pool::RedisPool;
use deadpool_redis::redis::{cmd, AsyncCommands};
use tracing::debug;

impl<P: RedisPool> RedisUtil<P> {
    /// 獲取字串值，不存在或失敗時返回 `None`
    pub async fn get(&self, key: &str) -> Option<String> {
        let key = key.to_owned();
        self.executor
            .execute("get", move |conn| {
                Box::pin(async move { conn.get::<_, Option<String>>(&key).await })
            })
            .await
            .flatten()
    }

    /// 帶失敗原因的查詢
    pub async fn fetch(&self, key: &str) -> Lookup<String> {
        let key = key.to_owned();
        self.executor
            .try_execute(move |conn| {
                Box::pin(async move { conn.get::<_, Option<String>>(&key).await })
            })
            .await
            .into()
    }

    /// 設置字串值
    pub async fn set(&self, key: &str, value: &str) -> bool {
        let (key, value) = (key.to_owned(), value.to_owned());
        self.executor
            .execute("set", move |conn| {
                Box::pin(async move { conn.set::<_, _, ()>(&key, &value).await })
            })
            .await
            .is_some()
    }

    /// 先刪除再設置，`ttl > 0` 時帶過期時間
    ///
    /// 兩條命令之間沒有原子性保證。
    pub async fn set_with_timeout(&self, key: &str, value: &str, ttl: i64) -> bool {
        let (key, value) = (key.to_owned(), value.to_owned());
        self.executor
            .execute("set_with_timeout", move |conn| {
                Box::pin(async move {
                    let _: i64 = conn.del(&key).await?;
                    if ttl > 0 {
                        cmd("SET")
                            .arg(&key)
                            .arg(&value)
                            .arg("EX")
                            .arg(ttl)
                            .query_async::<()>(conn)
                            .await
                    } else {
                        conn.set::<_, _, ()>(&key, &value).await
                    }
                })
            })
            .await
            .is_some()
    }

    /// 按正數增量遞增
    pub async fn incr(&self, key: &str, delta: i64) -> Result<i64, RedisUtilError> {
        let delta = positive_delta(delta)?;
        self.incr_by(key, delta).await
    }

    /// 按正數增量遞減
    pub async fn decr(&self, key: &str, delta: i64) -> Result<i64, RedisUtilError> {
        let delta = positive_delta(delta)?;
        self.incr_by(key, -delta).await
    }

    /// 遞增 1，失敗時返回 `None`
    pub async fn incr_one(&self, key: &str) -> Option<i64> {
        let key = key.to_owned();
        self.executor
            .execute("incr_one", move |conn| {
                Box::pin(async move { conn.incr::<_, _, i64>(&key, 1).await })
            })
            .await
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, RedisUtilError> {
        debug!(key, delta, "INCRBY");
        let key = key.to_owned();
        self.executor
            .try_execute(move |conn| {
                Box::pin(async move { conn.incr::<_, _, i64>(&key, delta).await })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::redis::executor::RedisUtilError;
    use crate::redis::operations::{Lookup, RedisUtil};
    use crate::redis::testing::{Reply, ScriptedPool};
    use assert_matches::assert_matches;
    use rstest::rstest;
    use std::time::Duration;

    fn util(pool: &ScriptedPool) -> RedisUtil<ScriptedPool> {
        RedisUtil::new(pool.clone(), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_get_and_set() {
        let pool = ScriptedPool::new();
        pool.push(Reply::ok()).push(Reply::bulk("v")).push(Reply::nil());
        let util = util(&pool);

        assert!(util.set("k", "v").await);
        assert_eq!(util.get("k").await.as_deref(), Some("v"));
        assert_eq!(util.get("missing").await, None);
        assert_eq!(pool.command_names(), vec!["SET", "GET", "GET"]);
    }

    #[tokio::test]
    async fn test_set_failure_is_false() {
        let pool = ScriptedPool::new();
        pool.push(Reply::error("READONLY"));
        assert!(!util(&pool).set("k", "v").await);
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn test_set_with_timeout_deletes_then_sets_with_expiry() {
        let pool = ScriptedPool::new();
        pool.push(Reply::int(1)).push(Reply::ok());

        assert!(util(&pool).set_with_timeout("k", "v", 5).await);
        assert_eq!(
            pool.commands(),
            vec![
                vec!["DEL".to_string(), "k".to_string()],
                vec!["SET".to_string(), "k".to_string(), "v".to_string(), "EX".to_string(), "5".to_string()],
            ]
        );
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[tokio::test]
    async fn test_set_with_non_positive_timeout_has_no_expiry(#[case] ttl: i64) {
        let pool = ScriptedPool::new();
        pool.push(Reply::int(0)).push(Reply::ok());

        assert!(util(&pool).set_with_timeout("k", "v", ttl).await);
        assert_eq!(pool.command_names(), vec!["DEL", "SET"]);
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    #[tokio::test]
    async fn test_non_positive_delta_is_rejected_without_connection(#[case] delta: i64) {
        let pool = ScriptedPool::new();
        let util = util(&pool);

        assert_matches!(util.incr("n", delta).await, Err(RedisUtilError::InvalidArgument(_)));
        assert_matches!(util.decr("n", delta).await, Err(RedisUtilError::InvalidArgument(_)));
        assert_eq!(pool.acquired(), 0);
        assert!(pool.commands().is_empty());
    }

    #[tokio::test]
    async fn test_decr_negates_delta() {
        let pool = ScriptedPool::new();
        pool.push(Reply::int(7)).push(Reply::int(4));
        let util = util(&pool);

        assert_eq!(util.incr("n", 7).await.ok(), Some(7));
        assert_eq!(util.decr("n", 3).await.ok(), Some(4));
        assert_eq!(pool.commands()[1], vec!["INCRBY", "n", "-3"]);
    }

    #[tokio::test]
    async fn test_incr_propagates_remote_error() {
        let pool = ScriptedPool::new();
        pool.push(Reply::error("ERR value is not an integer"));
        assert_matches!(util(&pool).incr("n", 1).await, Err(RedisUtilError::Remote(_)));
    }

    #[tokio::test]
    async fn test_incr_one() {
        let pool = ScriptedPool::new();
        pool.push(Reply::int(1)).push(Reply::error("WRONGTYPE"));
        let util = util(&pool);

        assert_eq!(util.incr_one("n").await, Some(1));
        assert_eq!(util.incr_one("n").await, None);
    }

    #[tokio::test]
    async fn test_fetch_distinguishes_outcomes() {
        let pool = ScriptedPool::new();
        pool.push(Reply::bulk("v")).push(Reply::nil()).push(Reply::error("ERR"));
        let util = util(&pool);

        assert_matches!(util.fetch("a").await, Lookup::Found(v) if v == "v");
        assert_matches!(util.fetch("b").await, Lookup::NotFound);
        assert_matches!(util.fetch("c").await, Lookup::Failed(RedisUtilError::Remote(_)));
    }
}
