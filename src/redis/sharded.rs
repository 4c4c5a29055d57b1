//! 客戶端分片連接池
//!
//! 以一致性雜湊環把鍵分配到多個獨立的單機 Redis。每個分片有自己的
//! deadpool 連接池；一個分片連接會從每個分片各取出一個連接，
//! 並依命令的鍵參數路由。多鍵命令的所有鍵必須位於同一分片。

use super::pool::{PoolStatus, RedisPool, RedisPoolError, SinglePool};
use async_trait::async_trait;
use deadpool_redis::redis::{
    aio::ConnectionLike, Arg, Cmd, ErrorKind, Pipeline, RedisError, RedisFuture, Value,
};
use futures::future::{join_all, try_join_all};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// 每單位權重的虛擬節點數
pub const VIRTUAL_NODES_PER_WEIGHT: u32 = 160;

/// 一致性雜湊環
#[derive(Debug, Clone)]
pub struct ShardRing {
    nodes: BTreeMap<u64, usize>,
    shard_count: usize,
}

impl ShardRing {
    /// 依各分片權重建立雜湊環
    pub fn new(weights: &[u32]) -> Self {
        let mut nodes = BTreeMap::new();
        for (index, weight) in weights.iter().enumerate() {
            for n in 0..VIRTUAL_NODES_PER_WEIGHT * (*weight).max(1) {
                let name = format!("SHARD-{}-NODE-{}", index, n);
                nodes.insert(hash(name.as_bytes()), index);
            }
        }
        Self {
            nodes,
            shard_count: weights.len(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// 鍵所屬的分片索引
    pub fn shard_for(&self, key: &[u8]) -> usize {
        let point = hash(key_tag(key));
        self.nodes
            .range(point..)
            .next()
            .or_else(|| self.nodes.iter().next())
            .map(|(_, shard)| *shard)
            .unwrap_or(0)
    }
}

/// 取 `{tag}` 中的內容作為雜湊依據，沒有非空標籤時使用整個鍵
fn key_tag(key: &[u8]) -> &[u8] {
    if let Some(open) = key.iter().position(|b| *b == b'{') {
        if let Some(len) = key[open + 1..].iter().position(|b| *b == b'}') {
            if len > 0 {
                return &key[open + 1..open + 1 + len];
            }
        }
    }
    key
}

fn hash(bytes: &[u8]) -> u64 {
    let digest = Sha256::digest(bytes);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// 命令的所有鍵參數
fn command_keys(cmd: &Cmd) -> Vec<&[u8]> {
    let args: Vec<&[u8]> = cmd
        .args_iter()
        .filter_map(|arg| match arg {
            Arg::Simple(bytes) => Some(bytes),
            Arg::Cursor => None,
        })
        .collect();
    let Some((name, rest)) = args.split_first() else {
        return Vec::new();
    };
    let name = String::from_utf8_lossy(name).to_ascii_uppercase();

    match name.as_str() {
        // 最後一個參數是阻塞秒數
        "BLPOP" | "BRPOP" | "BZPOPMIN" | "BZPOPMAX" => {
            rest.split_last().map(|(_, keys)| keys.to_vec()).unwrap_or_default()
        }
        "DEL" | "UNLINK" | "EXISTS" | "TOUCH" | "MGET" | "WATCH" | "SUNION" | "SINTER"
        | "SDIFF" | "PFCOUNT" => rest.to_vec(),
        "MSET" | "MSETNX" => rest.iter().step_by(2).copied().collect(),
        "RPOPLPUSH" | "SMOVE" | "RENAME" | "RENAMENX" => rest.iter().take(2).copied().collect(),
        _ => rest.first().copied().into_iter().collect(),
    }
}

/// 命令應送往的分片，多鍵分屬不同分片時返回錯誤
fn shard_for_command(ring: &ShardRing, cmd: &Cmd) -> Result<usize, RedisError> {
    let mut shards = command_keys(cmd).into_iter().map(|key| ring.shard_for(key));
    let Some(first) = shards.next() else {
        return Ok(0);
    };
    if shards.all(|shard| shard == first) {
        Ok(first)
    } else {
        Err(RedisError::from((
            ErrorKind::ClientError,
            "keys of a multi-key command map to different shards",
        )))
    }
}

/// 分片連接池
#[derive(Clone)]
pub struct ShardedPool {
    shards: Arc<Vec<SinglePool>>,
    ring: Arc<ShardRing>,
}

impl ShardedPool {
    /// 以分片連接池及其權重建立
    pub fn new(shards: Vec<(SinglePool, u32)>) -> Result<Self, RedisPoolError> {
        if shards.is_empty() {
            return Err(RedisPoolError::PoolInitError("分片列表不能為空".to_string()));
        }
        let weights: Vec<u32> = shards.iter().map(|(_, weight)| *weight).collect();
        let pools = shards.into_iter().map(|(pool, _)| pool).collect();

        Ok(Self {
            shards: Arc::new(pools),
            ring: Arc::new(ShardRing::new(&weights)),
        })
    }

    pub fn ring(&self) -> &ShardRing {
        &self.ring
    }

    pub fn shards(&self) -> &[SinglePool] {
        &self.shards
    }
}

#[async_trait]
impl RedisPool for ShardedPool {
    type Connection = ShardedConnection;

    async fn get_conn(&self) -> Result<ShardedConnection, RedisPoolError> {
        // 任一分片取連接失敗時，已取出的連接隨 Vec drop 歸還
        let conns = try_join_all(self.shards.iter().map(|pool| pool.get_conn())).await?;
        debug!(shards = conns.len(), "從分片連接池獲取連接成功");

        Ok(ShardedConnection {
            ring: self.ring.clone(),
            conns,
        })
    }

    async fn check_health(&self) -> bool {
        join_all(self.shards.iter().map(|pool| pool.check_health()))
            .await
            .into_iter()
            .all(|healthy| healthy)
    }

    fn pool_size(&self) -> u32 {
        self.shards.iter().map(|pool| pool.pool_size()).sum()
    }

    fn status(&self) -> PoolStatus {
        self.shards
            .iter()
            .map(|pool| pool.status())
            .fold(PoolStatus::default(), |acc, s| PoolStatus {
                max_size: acc.max_size + s.max_size,
                size: acc.size + s.size,
                available: acc.available + s.available,
            })
    }

    fn trim_idle(&self) {
        for pool in self.shards.iter() {
            pool.trim_idle();
        }
    }

    fn discard(&self, conn: ShardedConnection) {
        for (pool, conn) in self.shards.iter().zip(conn.conns) {
            pool.discard(conn);
        }
    }
}

/// 分片連接：每個分片各持有一個連接
pub struct ShardedConnection {
    ring: Arc<ShardRing>,
    conns: Vec<deadpool_redis::Connection>,
}

impl ConnectionLike for ShardedConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        match shard_for_command(&self.ring, cmd) {
            Ok(index) => self.conns[index].req_packed_command(cmd),
            Err(e) => Box::pin(async move { Err(e) }),
        }
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        _cmd: &'a Pipeline,
        _offset: usize,
        _count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        Box::pin(async {
            Err(RedisError::from((
                ErrorKind::ClientError,
                "pipelines are not supported by sharded connections",
            )))
        })
    }

    fn get_db(&self) -> i64 {
        self.conns.first().map(|conn| conn.get_db()).unwrap_or(0)
    }
}
