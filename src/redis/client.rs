use super::pool::{ClusterPool, PoolStatus, RedisPool, RedisPoolError, SinglePool};
use super::sharded::{ShardedConnection, ShardedPool};
use async_trait::async_trait;
use deadpool_redis::redis::{aio::ConnectionLike, Cmd, Pipeline, RedisFuture, Value};
use std::fmt;

/// Redis部署模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMode {
    Cluster,
    Single,
    Sharded,
}

impl ClientMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientMode::Cluster => "cluster",
            ClientMode::Single => "single",
            ClientMode::Sharded => "sharded",
        }
    }
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 三種模式之一的 Redis 客戶端，啟動時決定
#[derive(Clone)]
pub enum RedisClient {
    Cluster(ClusterPool),
    Single(SinglePool),
    Sharded(ShardedPool),
}

impl RedisClient {
    pub fn mode(&self) -> ClientMode {
        match self {
            RedisClient::Cluster(_) => ClientMode::Cluster,
            RedisClient::Single(_) => ClientMode::Single,
            RedisClient::Sharded(_) => ClientMode::Sharded,
        }
    }
}

impl From<ClusterPool> for RedisClient {
    fn from(pool: ClusterPool) -> Self {
        RedisClient::Cluster(pool)
    }
}

impl From<SinglePool> for RedisClient {
    fn from(pool: SinglePool) -> Self {
        RedisClient::Single(pool)
    }
}

impl From<ShardedPool> for RedisClient {
    fn from(pool: ShardedPool) -> Self {
        RedisClient::Sharded(pool)
    }
}

/// 由 [`RedisClient`] 取出的連接
pub enum RedisConnection {
    Cluster(deadpool_redis::cluster::Connection),
    Single(deadpool_redis::Connection),
    Sharded(ShardedConnection),
}

impl ConnectionLike for RedisConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        match self {
            RedisConnection::Cluster(conn) => conn.req_packed_command(cmd),
            RedisConnection::Single(conn) => conn.req_packed_command(cmd),
            RedisConnection::Sharded(conn) => conn.req_packed_command(cmd),
        }
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        match self {
            RedisConnection::Cluster(conn) => conn.req_packed_commands(cmd, offset, count),
            RedisConnection::Single(conn) => conn.req_packed_commands(cmd, offset, count),
            RedisConnection::Sharded(conn) => conn.req_packed_commands(cmd, offset, count),
        }
    }

    fn get_db(&self) -> i64 {
        match self {
            RedisConnection::Cluster(conn) => conn.get_db(),
            RedisConnection::Single(conn) => conn.get_db(),
            RedisConnection::Sharded(conn) => conn.get_db(),
        }
    }
}

#[async_trait]
impl RedisPool for RedisClient {
    type Connection = RedisConnection;

    async fn get_conn(&self) -> Result<RedisConnection, RedisPoolError> {
        Ok(match self {
            RedisClient::Cluster(pool) => RedisConnection::Cluster(pool.get_conn().await?),
            RedisClient::Single(pool) => RedisConnection::Single(pool.get_conn().await?),
            RedisClient::Sharded(pool) => RedisConnection::Sharded(pool.get_conn().await?),
        })
    }

    async fn check_health(&self) -> bool {
        match self {
            RedisClient::Cluster(pool) => pool.check_health().await,
            RedisClient::Single(pool) => pool.check_health().await,
            RedisClient::Sharded(pool) => pool.check_health().await,
        }
    }

    fn pool_size(&self) -> u32 {
        match self {
            RedisClient::Cluster(pool) => pool.pool_size(),
            RedisClient::Single(pool) => pool.pool_size(),
            RedisClient::Sharded(pool) => pool.pool_size(),
        }
    }

    fn status(&self) -> PoolStatus {
        match self {
            RedisClient::Cluster(pool) => pool.status(),
            RedisClient::Single(pool) => pool.status(),
            RedisClient::Sharded(pool) => pool.status(),
        }
    }

    fn trim_idle(&self) {
        match self {
            RedisClient::Cluster(pool) => pool.trim_idle(),
            RedisClient::Single(pool) => pool.trim_idle(),
            RedisClient::Sharded(pool) => pool.trim_idle(),
        }
    }

    fn discard(&self, conn: RedisConnection) {
        match (self, conn) {
            (RedisClient::Cluster(pool), RedisConnection::Cluster(conn)) => pool.discard(conn),
            (RedisClient::Single(pool), RedisConnection::Single(conn)) => pool.discard(conn),
            (RedisClient::Sharded(pool), RedisConnection::Sharded(conn)) => pool.discard(conn),
            // 連接總是由同一模式的連接池交出
            (_, conn) => drop(conn),
        }
    }
}
