//! 單元測試用的腳本化 Redis 連接池
//!
//! 按順序回放預先排好的回覆，記錄每條命令，並統計連接的取出與歸還。

use super::pool::{PoolStatus, RedisPool, RedisPoolError};
use async_trait::async_trait;
use deadpool_redis::redis::{
    aio::ConnectionLike, Arg, Cmd, ErrorKind, Pipeline, RedisError, RedisFuture, RedisResult,
    Value,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// 一條腳本化回覆
#[derive(Debug)]
pub enum Reply {
    Value(Value),
    Error(ErrorKind, &'static str),
    /// 延遲後回覆
    Delayed(Duration, Value),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Value(Value::Okay)
    }

    pub fn nil() -> Self {
        Reply::Value(Value::Nil)
    }

    pub fn int(n: i64) -> Self {
        Reply::Value(Value::Int(n))
    }

    pub fn bulk(s: &str) -> Self {
        Reply::Value(Value::BulkString(s.as_bytes().to_vec()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Reply::Value(Value::Array(items))
    }

    pub fn error(message: &'static str) -> Self {
        Reply::Error(ErrorKind::ResponseError, message)
    }
}

#[derive(Default)]
struct State {
    replies: Mutex<VecDeque<Reply>>,
    commands: Mutex<Vec<Vec<String>>>,
    acquired: AtomicUsize,
    released: AtomicUsize,
    discarded: AtomicUsize,
    trims: AtomicUsize,
    refuse: AtomicBool,
}

/// 腳本化連接池
#[derive(Clone)]
pub struct ScriptedPool {
    state: Arc<State>,
    permits: Arc<Semaphore>,
    max_size: usize,
    max_wait: Duration,
}

impl ScriptedPool {
    pub fn new() -> Self {
        Self::with_capacity(8, Duration::from_millis(200))
    }

    pub fn with_capacity(max_size: usize, max_wait: Duration) -> Self {
        Self {
            state: Arc::new(State::default()),
            permits: Arc::new(Semaphore::new(max_size)),
            max_size,
            max_wait,
        }
    }

    /// 追加回覆
    pub fn push(&self, reply: Reply) -> &Self {
        self.state.replies.lock().unwrap().push_back(reply);
        self
    }

    /// 之後所有取連接都失敗
    pub fn refuse_connections(&self) {
        self.state.refuse.store(true, Ordering::SeqCst);
    }

    /// 已發出的命令，例如 `["SET", "k", "v"]`
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.state.commands.lock().unwrap().clone()
    }

    pub fn command_names(&self) -> Vec<String> {
        self.commands().into_iter().map(|c| c[0].clone()).collect()
    }

    pub fn acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }

    /// 被移出連接池的連接數，不計入 `released`
    pub fn discarded(&self) -> usize {
        self.state.discarded.load(Ordering::SeqCst)
    }

    pub fn trims(&self) -> usize {
        self.state.trims.load(Ordering::SeqCst)
    }

    pub fn in_use(&self) -> usize {
        self.max_size - self.permits.available_permits()
    }
}

#[async_trait]
impl RedisPool for ScriptedPool {
    type Connection = ScriptedConnection;

    async fn get_conn(&self) -> Result<ScriptedConnection, RedisPoolError> {
        if self.state.refuse.load(Ordering::SeqCst) {
            return Err(RedisPoolError::Backend(RedisError::from((
                ErrorKind::IoError,
                "connection refused",
            ))));
        }
        let permit = tokio::time::timeout(self.max_wait, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| RedisPoolError::Exhausted("Wait".to_string()))?
            .map_err(|_| RedisPoolError::Closed)?;

        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedConnection {
            state: self.state.clone(),
            discarded: false,
            _permit: permit,
        })
    }

    async fn check_health(&self) -> bool {
        !self.state.refuse.load(Ordering::SeqCst)
    }

    fn pool_size(&self) -> u32 {
        self.max_size as u32
    }

    fn status(&self) -> PoolStatus {
        PoolStatus {
            max_size: self.max_size,
            size: self.max_size,
            available: self.permits.available_permits(),
        }
    }

    fn trim_idle(&self) {
        self.state.trims.fetch_add(1, Ordering::SeqCst);
    }

    fn discard(&self, mut conn: ScriptedConnection) {
        conn.discarded = true;
    }
}

/// 腳本化連接，drop 時計入歸還或丟棄
pub struct ScriptedConnection {
    state: Arc<State>,
    discarded: bool,
    _permit: OwnedSemaphorePermit,
}

impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        if self.discarded {
            self.state.discarded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.state.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl ConnectionLike for ScriptedConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        let args = cmd
            .args_iter()
            .map(|arg| match arg {
                Arg::Simple(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                Arg::Cursor => "<cursor>".to_string(),
            })
            .collect();
        self.state.commands.lock().unwrap().push(args);
        let reply = self.state.replies.lock().unwrap().pop_front();

        Box::pin(async move {
            let result: RedisResult<Value> = match reply {
                Some(Reply::Value(value)) => Ok(value),
                Some(Reply::Error(kind, message)) => Err(RedisError::from((kind, message))),
                Some(Reply::Delayed(delay, value)) => {
                    tokio::time::sleep(delay).await;
                    Ok(value)
                }
                None => Err(RedisError::from((ErrorKind::ClientError, "no scripted reply"))),
            };
            result
        })
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        _cmd: &'a Pipeline,
        _offset: usize,
        _count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        Box::pin(async { Err(RedisError::from((ErrorKind::ClientError, "pipelines not scripted"))) })
    }

    fn get_db(&self) -> i64 {
        0
    }
}
