use crate::config::types::{PoolSettings, RedisSettings};
use async_trait::async_trait;
use deadpool::managed::{Manager, Object, PoolError, QueueMode};
use deadpool_redis::{
    cluster,
    redis::{aio::ConnectionLike, cmd, ConnectionInfo, RedisError},
    Connection, Pool, PoolConfig, Runtime, Timeouts,
};
use std::cell::Cell;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Redis連接池錯誤
#[derive(Error, Debug)]
pub enum RedisPoolError {
    /// 連接池初始化錯誤
    #[error("Redis連接池初始化錯誤: {0}")]
    PoolInitError(String),

    /// 等待超過 max-wait 仍無可用連接
    #[error("Redis連接池已耗盡: {0}")]
    Exhausted(String),

    /// 無法建立新連接
    #[error("無法建立Redis連接: {0}")]
    Backend(#[from] RedisError),

    /// 連接池已關閉
    #[error("Redis連接池已關閉")]
    Closed,

    /// 其他錯誤
    #[error("Redis連接池其他錯誤: {0}")]
    Other(String),
}

/// 從deadpool錯誤轉換為RedisPoolError
impl From<PoolError<RedisError>> for RedisPoolError {
    fn from(error: PoolError<RedisError>) -> Self {
        match error {
            PoolError::Timeout(kind) => RedisPoolError::Exhausted(format!("{:?}", kind)),
            PoolError::Backend(e) => RedisPoolError::Backend(e),
            PoolError::Closed => RedisPoolError::Closed,
            other => RedisPoolError::Other(other.to_string()),
        }
    }
}

/// 連接池狀態快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStatus {
    pub max_size: usize,
    /// 已建立的連接數
    pub size: usize,
    /// 閒置可用的連接數
    pub available: usize,
}

impl From<deadpool::Status> for PoolStatus {
    fn from(status: deadpool::Status) -> Self {
        Self {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
        }
    }
}

/// Redis連接池接口
///
/// 取出的連接由呼叫方獨佔，drop 時歸還連接池。
#[async_trait]
pub trait RedisPool: Send + Sync + 'static {
    /// 連接池交出的連接類型
    type Connection: ConnectionLike + Send + Sync;

    /// 獲取連接，最多等待 max-wait
    async fn get_conn(&self) -> Result<Self::Connection, RedisPoolError>;

    /// 檢查連接池健康狀態
    async fn check_health(&self) -> bool;

    /// 獲取連接池大小
    fn pool_size(&self) -> u32;

    /// 連接池狀態
    fn status(&self) -> PoolStatus;

    /// 關閉多於閒置上限的連接
    fn trim_idle(&self) {}

    /// 把連接移出連接池並關閉，用於狀態不明的連接
    fn discard(&self, conn: Self::Connection);
}

/// 依配置生成 deadpool 連接池參數
pub(crate) fn pool_config(settings: &RedisSettings) -> PoolConfig {
    PoolConfig {
        max_size: settings.pool.max_active as usize,
        timeouts: Timeouts {
            wait: settings.pool.max_wait(),
            create: Some(settings.timeout()),
            recycle: Some(settings.timeout()),
        },
        queue_mode: QueueMode::Fifo,
    }
}

/// 只保留前 `max_idle` 個閒置連接
fn retain_idle<M, W>(pool: &deadpool::managed::Pool<M, W>, max_idle: usize)
where
    M: Manager,
    W: From<Object<M>>,
{
    let before = pool.status().available;
    if before <= max_idle {
        return;
    }
    let kept = Cell::new(0usize);
    let _ = pool.retain(|_, _| {
        let keep = kept.get() < max_idle;
        if keep {
            kept.set(kept.get() + 1);
        }
        keep
    });
    debug!(before, max_idle, "已關閉多餘的閒置連接");
}

async fn ping<C: ConnectionLike + Send>(conn: &mut C) -> Result<(), RedisError> {
    let pong: String = cmd("PING").query_async(conn).await?;
    if pong == "PONG" {
        Ok(())
    } else {
        Err(RedisError::from((
            deadpool_redis::redis::ErrorKind::ResponseError,
            "unexpected PING reply",
            pong,
        )))
    }
}

/// 單機 Redis 連接池
#[derive(Clone)]
pub struct SinglePool {
    pool: Pool,
    settings: PoolSettings,
}

impl SinglePool {
    /// 以連接資訊建立連接池，不會立即建立連接
    pub fn new(info: ConnectionInfo, settings: &RedisSettings) -> Result<Self, RedisPoolError> {
        let mut cfg = deadpool_redis::Config::from_connection_info(info);
        cfg.pool = Some(pool_config(settings));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| RedisPoolError::PoolInitError(e.to_string()))?;

        info!(max_size = settings.pool.max_active, "Redis單機連接池初始化完成");

        Ok(Self {
            pool,
            settings: settings.pool.clone(),
        })
    }
}

#[async_trait]
impl RedisPool for SinglePool {
    type Connection = Connection;

    async fn get_conn(&self) -> Result<Connection, RedisPoolError> {
        match self.pool.get().await {
            Ok(conn) => {
                debug!("從Redis連接池獲取連接成功");
                Ok(conn)
            }
            Err(e) => {
                error!("無法從Redis連接池獲取連接: {}", e);
                Err(e.into())
            }
        }
    }

    async fn check_health(&self) -> bool {
        match self.pool.get().await {
            Ok(mut conn) => match ping(&mut conn).await {
                Ok(()) => true,
                Err(e) => {
                    error!("Redis健康檢查錯誤: {}", e);
                    false
                }
            },
            Err(e) => {
                error!("Redis健康檢查無法獲取連接: {}", e);
                false
            }
        }
    }

    fn pool_size(&self) -> u32 {
        self.settings.max_active
    }

    fn status(&self) -> PoolStatus {
        self.pool.status().into()
    }

    fn trim_idle(&self) {
        retain_idle(&self.pool, self.settings.idle_ceiling() as usize);
    }

    fn discard(&self, conn: Connection) {
        drop(Connection::take(conn));
        debug!("已從Redis連接池移除連接");
    }
}

/// Redis 集群連接池，槽位重定向由 redis 集群客戶端處理
#[derive(Clone)]
pub struct ClusterPool {
    pool: cluster::Pool,
    settings: PoolSettings,
    node_count: usize,
}

impl ClusterPool {
    /// 以種子節點建立集群連接池
    pub fn new(nodes: Vec<ConnectionInfo>, settings: &RedisSettings) -> Result<Self, RedisPoolError> {
        let node_count = nodes.len();
        let cfg = cluster::Config {
            connections: Some(nodes.into_iter().map(Into::into).collect()),
            pool: Some(pool_config(settings)),
            ..Default::default()
        };
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| RedisPoolError::PoolInitError(e.to_string()))?;

        info!(nodes = node_count, max_size = settings.pool.max_active, "Redis集群連接池初始化完成");

        Ok(Self {
            pool,
            settings: settings.pool.clone(),
            node_count,
        })
    }

    /// 集群種子節點數量
    pub fn node_count(&self) -> usize {
        self.node_count
    }
}

#[async_trait]
impl RedisPool for ClusterPool {
    type Connection = cluster::Connection;

    async fn get_conn(&self) -> Result<cluster::Connection, RedisPoolError> {
        self.pool.get().await.map_err(|e| {
            error!("無法從Redis集群連接池獲取連接: {}", e);
            RedisPoolError::from(e)
        })
    }

    async fn check_health(&self) -> bool {
        match self.pool.get().await {
            Ok(mut conn) => match ping(&mut conn).await {
                Ok(()) => true,
                Err(e) => {
                    error!("Redis集群健康檢查錯誤: {}", e);
                    false
                }
            },
            Err(e) => {
                error!("Redis集群健康檢查無法獲取連接: {}", e);
                false
            }
        }
    }

    fn pool_size(&self) -> u32 {
        self.settings.max_active
    }

    fn status(&self) -> PoolStatus {
        self.pool.status().into()
    }

    fn trim_idle(&self) {
        retain_idle(&self.pool, self.settings.idle_ceiling() as usize);
    }

    fn discard(&self, conn: cluster::Connection) {
        drop(cluster::Connection::take(conn));
        debug!("已從Redis集群連接池移除連接");
    }
}

/// 單次等待的上限，用於日誌顯示
pub(crate) fn describe_wait(wait: Option<Duration>) -> String {
    match wait {
        Some(d) => format!("{}ms", d.as_millis()),
        None => "unbounded".to_string(),
    }
}
