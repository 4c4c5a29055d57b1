//! Redis存儲模組
//!
//! 此模組提供集群、單機與客戶端分片三種部署模式的連接池，
//! 受管理的執行器，以及常用鍵值操作的門面。

pub mod client;
pub mod executor;
pub mod factory;
pub mod operations;
pub mod pool;
pub mod sharded;

#[cfg(test)]
pub mod test_config;
#[cfg(test)]
pub mod testing;

pub use client::{ClientMode, RedisClient, RedisConnection};
pub use executor::{Executor, RedisCallback, RedisUtilError};
pub use factory::{ConfigurationError, Deployment, HostAndPort, RedisFactory};
pub use operations::{Lookup, RedisUtil};
pub use pool::{ClusterPool, PoolStatus, RedisPool, RedisPoolError, SinglePool};
pub use sharded::{ShardRing, ShardedConnection, ShardedPool};
