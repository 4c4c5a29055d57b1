//! Redis客戶端工廠
//!
//! 依配置選擇部署模式並建立連接池：
//! 1. `cluster.nodes` 非空 → 集群連接池
//! 2. 否則 `host` 非空 → 單機連接池與分片連接池
//! 3. 兩者皆無 → 配置錯誤，不使用任何預設地址

use super::client::{ClientMode, RedisClient};
use super::pool::{describe_wait, ClusterPool, RedisPool, RedisPoolError, SinglePool};
use super::sharded::ShardedPool;
use crate::config::types::{RedisSettings, ShardSettings};
use crate::config::validation::{ValidationError, Validator};
use deadpool_redis::redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use futures::future::try_join_all;
use thiserror::Error;
use tracing::{info, warn};

/// 啟動配置錯誤，發生時進程不應啟動
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// 節點地址格式錯誤
    #[error("無效的節點地址 '{node}': {reason}")]
    MalformedNode { node: String, reason: String },

    /// 既沒有集群節點也沒有主機地址
    #[error("未配置 redis.cluster.nodes 或 redis.host")]
    MissingEndpoint,

    /// 配置驗證失敗
    #[error("Redis配置無效: {0}")]
    Invalid(#[from] ValidationError),

    /// 連接池建立失敗
    #[error("Redis連接池建立失敗: {0}")]
    PoolCreation(#[from] RedisPoolError),

    /// 啟動時無法連上 Redis
    #[error("無法連接Redis {target}: {reason}")]
    Unreachable { target: String, reason: String },
}

/// 集群節點地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAndPort {
    pub host: String,
    pub port: u16,
}

impl HostAndPort {
    /// 解析 `host:port`，必須恰好以一個冒號分成兩段
    pub fn parse(node: &str) -> Result<Self, ConfigurationError> {
        let malformed = |reason: &str| ConfigurationError::MalformedNode {
            node: node.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = node.split(':').collect();
        if segments.len() != 2 {
            return Err(malformed("應為 host:port，例如 '192.168.10.1:7000'"));
        }
        let host = segments[0].trim();
        if host.is_empty() {
            return Err(malformed("主機不能為空"));
        }
        let port = segments[1]
            .trim()
            .parse::<u16>()
            .map_err(|e| malformed(&format!("端口無效: {}", e)))?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// 轉換為連接資訊，密碼非空時帶上認證
    pub fn connection_info(&self, password: Option<&str>) -> ConnectionInfo {
        connection_info(&self.host, self.port, password, 0)
    }
}

fn connection_info(host: &str, port: u16, password: Option<&str>, database: i64) -> ConnectionInfo {
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(host.to_string(), port),
        redis: RedisConnectionInfo {
            db: database,
            password: password.map(str::to_string),
            ..Default::default()
        },
    }
}

/// 工廠解析出的部署
#[derive(Clone)]
pub enum Deployment {
    /// 集群模式
    Cluster(ClusterPool),
    /// 單機模式，同時提供單機與分片連接池
    Standalone {
        single: SinglePool,
        sharded: ShardedPool,
    },
}

impl std::fmt::Debug for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deployment::Cluster(_) => f.write_str("Deployment::Cluster"),
            Deployment::Standalone { .. } => f.write_str("Deployment::Standalone"),
        }
    }
}

impl Deployment {
    pub fn cluster(&self) -> Option<RedisClient> {
        match self {
            Deployment::Cluster(pool) => Some(RedisClient::Cluster(pool.clone())),
            Deployment::Standalone { .. } => None,
        }
    }

    pub fn single(&self) -> Option<RedisClient> {
        match self {
            Deployment::Standalone { single, .. } => Some(RedisClient::Single(single.clone())),
            Deployment::Cluster(_) => None,
        }
    }

    pub fn sharded(&self) -> Option<RedisClient> {
        match self {
            Deployment::Standalone { sharded, .. } => Some(RedisClient::Sharded(sharded.clone())),
            Deployment::Cluster(_) => None,
        }
    }

    /// 指定模式的客戶端
    pub fn client(&self, mode: ClientMode) -> Option<RedisClient> {
        match mode {
            ClientMode::Cluster => self.cluster(),
            ClientMode::Single => self.single(),
            ClientMode::Sharded => self.sharded(),
        }
    }

    /// 此部署提供的所有客戶端
    pub fn clients(&self) -> Vec<RedisClient> {
        [ClientMode::Cluster, ClientMode::Single, ClientMode::Sharded]
            .into_iter()
            .filter_map(|mode| self.client(mode))
            .collect()
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, Deployment::Cluster(_))
    }
}

/// Redis客戶端工廠
pub struct RedisFactory;

impl RedisFactory {
    /// 解析配置並建立連接池，不建立任何連接
    pub fn resolve(settings: &RedisSettings) -> Result<Deployment, ConfigurationError> {
        if settings.is_cluster() {
            let nodes = settings
                .cluster
                .nodes
                .iter()
                .map(|node| HostAndPort::parse(node))
                .collect::<Result<Vec<_>, _>>()?;
            settings.pool.validate()?;

            let infos = nodes
                .iter()
                .map(|node| node.connection_info(settings.password()))
                .collect();
            let pool = ClusterPool::new(infos, settings)?;
            info!(nodes = pool.node_count(), "使用Redis集群模式");
            return Ok(Deployment::Cluster(pool));
        }

        let Some(host) = settings.host() else {
            return Err(ConfigurationError::MissingEndpoint);
        };
        settings.validate()?;

        let single = SinglePool::new(
            connection_info(host, settings.port, settings.password(), settings.database),
            settings,
        )?;
        let sharded = Self::sharded_pool(settings, host)?;
        info!(
            host,
            port = settings.port,
            database = settings.database,
            shards = sharded.shards().len(),
            "使用Redis單機與分片模式"
        );

        Ok(Deployment::Standalone { single, sharded })
    }

    /// 解析配置、建立連接池，並在啟動時確認每個連接池可用
    pub async fn connect(settings: &RedisSettings) -> Result<Deployment, ConfigurationError> {
        let deployment = Self::resolve(settings)?;

        if !settings.verify_on_startup {
            warn!("已關閉啟動時的Redis連接檢查");
            return Ok(deployment);
        }

        for client in deployment.clients() {
            Self::verify(&client, settings.pool.idle_floor() as usize).await?;
        }
        info!(
            max_wait = %describe_wait(settings.pool.max_wait()),
            min_idle = settings.pool.idle_floor(),
            "Redis連接檢查通過"
        );

        Ok(deployment)
    }

    /// PING 並預先建立 min_idle 個連接
    async fn verify(client: &RedisClient, min_idle: usize) -> Result<(), ConfigurationError> {
        let unreachable = |reason: String| ConfigurationError::Unreachable {
            target: client.mode().to_string(),
            reason,
        };

        if !client.check_health().await {
            return Err(unreachable("PING失敗".to_string()));
        }

        // 同時持有 min_idle 個連接，歸還後成為閒置連接
        let warm = try_join_all((0..min_idle).map(|_| client.get_conn()))
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        drop(warm);

        Ok(())
    }

    fn sharded_pool(settings: &RedisSettings, host: &str) -> Result<ShardedPool, ConfigurationError> {
        let shards: Vec<ShardSettings> = if settings.shards.is_empty() {
            vec![ShardSettings {
                host: host.to_string(),
                port: settings.port,
                password: settings.password.clone(),
                database: Some(settings.database),
                weight: 1,
            }]
        } else {
            settings.shards.clone()
        };

        let pools = shards
            .iter()
            .map(|shard| {
                let password = shard.password.as_deref().filter(|p| !p.trim().is_empty());
                let info = connection_info(&shard.host, shard.port, password, shard.database.unwrap_or(0));
                SinglePool::new(info, settings).map(|pool| (pool, shard.weight))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ShardedPool::new(pools)?)
    }
}
