//! 列表操作

use super::{apply_ttl, RedisUtil};
use crate::redis::pool::RedisPool;
use deadpool_redis::redis::{cmd, AsyncCommands};
use std::time::Duration;

/// 列表端點
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Left,
    Right,
}

impl End {
    fn push(self) -> &'static str {
        match self {
            End::Left => "LPUSH",
            End::Right => "RPUSH",
        }
    }

    fn pop(self) -> &'static str {
        match self {
            End::Left => "LPOP",
            End::Right => "RPOP",
        }
    }

    fn blocking_pop(self) -> &'static str {
        match self {
            End::Left => "BLPOP",
            End::Right => "BRPOP",
        }
    }
}

impl<P: RedisPool> RedisUtil<P> {
    pub async fn lrange(&self, key: &str, start: isize, stop: isize) -> Option<Vec<String>> {
        let key = key.to_owned();
        self.executor
            .execute("lrange", move |conn| {
                Box::pin(async move { conn.lrange::<_, Vec<String>>(&key, start, stop).await })
            })
            .await
    }

    /// 列表長度，失敗時返回 0
    pub async fn llen(&self, key: &str) -> i64 {
        let key = key.to_owned();
        self.executor
            .execute("llen", move |conn| {
                Box::pin(async move { conn.llen::<_, i64>(&key).await })
            })
            .await
            .unwrap_or(0)
    }

    pub async fn lindex(&self, key: &str, index: isize) -> Option<String> {
        let key = key.to_owned();
        self.executor
            .execute("lindex", move |conn| {
                Box::pin(async move { conn.lindex::<_, Option<String>>(&key, index).await })
            })
            .await
            .flatten()
    }

    pub async fn lpush(&self, key: &str, values: &[&str]) -> bool {
        self.push(End::Left, key, values, 0).await
    }

    pub async fn lpush_with_ttl(&self, key: &str, values: &[&str], ttl: i64) -> bool {
        self.push(End::Left, key, values, ttl).await
    }

    pub async fn rpush(&self, key: &str, values: &[&str]) -> bool {
        self.push(End::Right, key, values, 0).await
    }

    pub async fn rpush_with_ttl(&self, key: &str, values: &[&str], ttl: i64) -> bool {
        self.push(End::Right, key, values, ttl).await
    }

    pub async fn lset(&self, key: &str, index: isize, value: &str) -> bool {
        let (key, value) = (key.to_owned(), value.to_owned());
        self.executor
            .execute("lset", move |conn| {
                Box::pin(async move { conn.lset::<_, _, ()>(&key, index, &value).await })
            })
            .await
            .is_some()
    }

    /// 返回移除的元素數，失敗時為 0
    pub async fn lrem(&self, key: &str, count: isize, value: &str) -> i64 {
        let (key, value) = (key.to_owned(), value.to_owned());
        self.executor
            .execute("lrem", move |conn| {
                Box::pin(async move { conn.lrem::<_, _, i64>(&key, count, &value).await })
            })
            .await
            .unwrap_or(0)
    }

    pub async fn lpop(&self, key: &str) -> Option<String> {
        self.pop(End::Left, key, 0).await
    }

    /// 彈出後為列表重新設置過期時間
    pub async fn lpop_with_ttl(&self, key: &str, ttl: i64) -> Option<String> {
        self.pop(End::Left, key, ttl).await
    }

    pub async fn rpop(&self, key: &str) -> Option<String> {
        self.pop(End::Right, key, 0).await
    }

    pub async fn rpop_with_ttl(&self, key: &str, ttl: i64) -> Option<String> {
        self.pop(End::Right, key, ttl).await
    }

    /// 阻塞彈出，返回 `(key, value)`，超時或失敗時為 `None`
    ///
    /// `timeout_secs` 為 0 時最多等待命令超時時間。
    pub async fn blpop(&self, timeout_secs: u64, keys: &[&str]) -> Option<(String, String)> {
        self.blocking_pop(End::Left, timeout_secs, keys).await
    }

    pub async fn brpop(&self, timeout_secs: u64, keys: &[&str]) -> Option<(String, String)> {
        self.blocking_pop(End::Right, timeout_secs, keys).await
    }

    async fn push(&self, end: End, key: &str, values: &[&str], ttl: i64) -> bool {
        if values.is_empty() {
            return false;
        }
        let key = key.to_owned();
        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.executor
            .execute(end.push(), move |conn| {
                Box::pin(async move {
                    cmd(end.push())
                        .arg(&key)
                        .arg(&values)
                        .query_async::<i64>(&mut *conn)
                        .await?;
                    apply_ttl(conn, &key, ttl).await
                })
            })
            .await
            .is_some()
    }

    async fn pop(&self, end: End, key: &str, ttl: i64) -> Option<String> {
        let key = key.to_owned();
        self.executor
            .execute(end.pop(), move |conn| {
                Box::pin(async move {
                    let value = cmd(end.pop())
                        .arg(&key)
                        .query_async::<Option<String>>(&mut *conn)
                        .await?;
                    apply_ttl(conn, &key, ttl).await?;
                    Ok(value)
                })
            })
            .await
            .flatten()
    }

    async fn blocking_pop(&self, end: End, timeout_secs: u64, keys: &[&str]) -> Option<(String, String)> {
        if keys.is_empty() {
            return None;
        }
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.executor
            .execute_blocking(end.blocking_pop(), Duration::from_secs(timeout_secs), move |conn| {
                Box::pin(async move {
                    cmd(end.blocking_pop())
                        .arg(&keys)
                        .arg(timeout_secs)
                        .query_async::<Option<(String, String)>>(conn)
                        .await
                })
            })
            .await
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use crate::redis::operations::RedisUtil;
    use crate::redis::testing::{Reply, ScriptedPool};
    use deadpool_redis::redis::Value;
    use std::time::Duration;

    fn util(pool: &ScriptedPool) -> RedisUtil<ScriptedPool> {
        RedisUtil::new(pool.clone(), Duration::from_millis(200))
    }

    fn bulk(s: &str) -> Value {
        Value::BulkString(s.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_push_with_ttl() {
        let pool = ScriptedPool::new();
        pool.push(Reply::int(2)).push(Reply::int(1)).push(Reply::int(3));
        let util = util(&pool);

        assert!(util.lpush_with_ttl("q", &["a", "b"], 60).await);
        assert!(util.rpush("q", &["c"]).await);
        assert_eq!(pool.command_names(), vec!["LPUSH", "EXPIRE", "RPUSH"]);
        assert_eq!(pool.commands()[0], vec!["LPUSH", "q", "a", "b"]);
    }

    #[tokio::test]
    async fn test_push_nothing_is_false() {
        let pool = ScriptedPool::new();
        assert!(!util(&pool).lpush("q", &[]).await);
        assert_eq!(pool.acquired(), 0);
    }

    #[tokio::test]
    async fn test_range_len_and_index() {
        let pool = ScriptedPool::new();
        pool.push(Reply::array(vec![bulk("a"), bulk("b")]))
            .push(Reply::int(2))
            .push(Reply::nil());
        let util = util(&pool);

        assert_eq!(util.lrange("q", 0, -1).await, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(util.llen("q").await, 2);
        assert_eq!(util.lindex("q", 9).await, None);
        assert_eq!(pool.commands()[0], vec!["LRANGE", "q", "0", "-1"]);
    }

    #[tokio::test]
    async fn test_llen_failure_is_zero() {
        let pool = ScriptedPool::new();
        pool.push(Reply::error("WRONGTYPE"));

        assert_eq!(util(&pool).llen("not-a-list").await, 0);
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn test_lset_and_lrem() {
        let pool = ScriptedPool::new();
        pool.push(Reply::error("ERR index out of range")).push(Reply::int(2));
        let util = util(&pool);

        assert!(!util.lset("q", 5, "x").await);
        assert_eq!(util.lrem("q", 0, "a").await, 2);
    }

    #[tokio::test]
    async fn test_pop_with_ttl_refreshes_expiry() {
        let pool = ScriptedPool::new();
        pool.push(Reply::bulk("a")).push(Reply::int(1)).push(Reply::nil());
        let util = util(&pool);

        assert_eq!(util.rpop_with_ttl("q", 30).await.as_deref(), Some("a"));
        assert_eq!(util.lpop("q").await, None);
        assert_eq!(pool.command_names(), vec!["RPOP", "EXPIRE", "LPOP"]);
    }

    #[tokio::test]
    async fn test_blocking_pop() {
        let pool = ScriptedPool::new();
        pool.push(Reply::array(vec![bulk("q"), bulk("job-1")])).push(Reply::nil());
        let util = util(&pool);

        assert_eq!(
            util.blpop(1, &["q"]).await,
            Some(("q".to_string(), "job-1".to_string()))
        );
        assert_eq!(util.brpop(1, &["q", "r"]).await, None);
        assert_eq!(pool.commands()[1], vec!["BRPOP", "q", "r", "1"]);
    }

    #[tokio::test]
    async fn test_blocking_pop_gets_extra_time_budget() {
        let pool = ScriptedPool::new();
        pool.push(Reply::Delayed(
            Duration::from_millis(600),
            Value::Array(vec![bulk("q"), bulk("late")]),
        ));

        assert_eq!(
            util(&pool).blpop(1, &["q"]).await,
            Some(("q".to_string(), "late".to_string()))
        );
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn test_unbounded_blocking_pop_drops_connection_on_timeout() {
        let pool = ScriptedPool::new();
        pool.push(Reply::Delayed(Duration::from_secs(5), Value::Nil));

        assert_eq!(util(&pool).blpop(0, &["q"]).await, None);
        assert_eq!(pool.commands()[0], vec!["BLPOP", "q", "0"]);
        assert_eq!(pool.discarded(), 1);
        assert_eq!(pool.released(), 0);
    }
}
