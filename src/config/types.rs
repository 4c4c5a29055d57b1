use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::config::validation::{ValidationError, ValidationUtils, Validator};

/// 未設置超時時使用的預設值（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// 應用程序配置結構
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub redis: RedisSettings,
    pub server: ServerConfig,
    pub log: LogConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證各個部分的配置
        self.redis.validate()?;
        self.server.validate()?;
        self.log.validate()?;

        Ok(())
    }
}

/// Redis配置
///
/// 三種部署模式共用一份配置：
/// - `cluster.nodes` 非空時使用集群模式（優先）
/// - 否則 `host` 非空時同時建立單機連接池與分片連接池
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: i64,
    /// 連接與命令超時（毫秒），0 表示使用預設值
    #[serde(default)]
    pub timeout_ms: u64,
    #[serde(default)]
    pub cluster: ClusterSettings,
    #[serde(default)]
    pub pool: PoolSettings,
    /// 分片節點列表，為空時以 host/port 作為唯一分片
    #[serde(default)]
    pub shards: Vec<ShardSettings>,
    /// 啟動時是否 PING 所有連接池並預熱 min_idle
    #[serde(default = "default_true")]
    pub verify_on_startup: bool,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            password: None,
            database: 0,
            timeout_ms: 0,
            cluster: ClusterSettings::default(),
            pool: PoolSettings::default(),
            shards: Vec::new(),
            verify_on_startup: true,
        }
    }
}

impl RedisSettings {
    /// 以單機地址建立配置
    pub fn standalone(host: &str, port: u16) -> Self {
        Self {
            host: Some(host.to_string()),
            port,
            ..Default::default()
        }
    }

    /// 以集群節點建立配置
    pub fn cluster<S: Into<String>>(nodes: impl IntoIterator<Item = S>) -> Self {
        Self {
            cluster: ClusterSettings {
                nodes: nodes.into_iter().map(Into::into).collect(),
            },
            ..Default::default()
        }
    }

    /// 有效的超時時間
    pub fn timeout(&self) -> Duration {
        if self.timeout_ms > 0 {
            Duration::from_millis(self.timeout_ms)
        } else {
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        }
    }

    /// 非空密碼
    pub fn password(&self) -> Option<&str> {
        non_blank(self.password.as_deref())
    }

    /// 非空主機
    pub fn host(&self) -> Option<&str> {
        non_blank(self.host.as_deref())
    }

    pub fn is_cluster(&self) -> bool {
        !self.cluster.nodes.is_empty()
    }
}

impl Validator for RedisSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_cluster() && self.host().is_none() {
            return Err(ValidationError::MissingField(
                "redis.host 或 redis.cluster.nodes".to_string(),
            ));
        }
        ValidationUtils::in_range(self.database, 0, i64::MAX, "redis.database")?;
        for shard in &self.shards {
            shard.validate()?;
        }
        self.pool.validate()?;

        Ok(())
    }
}

/// 集群配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSettings {
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// 連接池配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    #[serde(default = "default_max_active")]
    pub max_active: u32,
    /// 獲取連接的最長等待（毫秒），負數表示無限等待
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: i64,
    #[serde(default = "default_max_idle")]
    pub max_idle: u32,
    #[serde(default)]
    pub min_idle: u32,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_active: default_max_active(),
            max_wait_ms: default_max_wait_ms(),
            max_idle: default_max_idle(),
            min_idle: 0,
        }
    }
}

impl PoolSettings {
    /// 獲取連接的等待時間，None 表示無限等待
    pub fn max_wait(&self) -> Option<Duration> {
        u64::try_from(self.max_wait_ms).ok().map(Duration::from_millis)
    }

    /// 實際保留的閒置連接上限，不超過 max_active
    pub fn idle_ceiling(&self) -> u32 {
        self.max_idle.min(self.max_active)
    }

    /// 啟動時預先建立的連接數，不超過閒置上限
    pub fn idle_floor(&self) -> u32 {
        self.min_idle.min(self.idle_ceiling())
    }
}

/// 各數值原樣交給連接池，只拒絕無法建立連接池的配置
impl Validator for PoolSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::in_range(self.max_active, 1, u32::MAX, "redis.pool.max_active")?;

        Ok(())
    }
}

/// 分片節點配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardSettings {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<i64>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl Validator for ShardSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.host, "redis.shards.host")?;
        ValidationUtils::in_range(self.weight, 1, 100, "redis.shards.weight")?;

        Ok(())
    }
}

/// 伺服器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Validator for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證服務器配置
        ValidationUtils::not_empty(&self.host, "server.host")?;
        ValidationUtils::in_range(self.port, 1, 65535, "server.port")?;
        ValidationUtils::in_range(self.request_timeout_secs, 1, 3600, "server.request_timeout_secs")?;

        Ok(())
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
    /// 滾動日誌檔目錄，未設置時只輸出到終端
    #[serde(default)]
    pub directory: Option<String>,
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證日誌級別
        ValidationUtils::one_of(
            &self.level.to_lowercase(),
            &["trace", "debug", "info", "warn", "error"].iter().map(|s| s.to_string()).collect::<Vec<String>>(),
            "log.level"
        )?;

        // 驗證日誌格式
        ValidationUtils::one_of(
            &self.format.to_lowercase(),
            &["pretty", "json"].iter().map(|s| s.to_string()).collect::<Vec<String>>(),
            "log.format"
        )?;

        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn default_port() -> u16 {
    6379
}

fn default_true() -> bool {
    true
}

fn default_max_active() -> u32 {
    8
}

fn default_max_wait_ms() -> i64 {
    -1
}

fn default_max_idle() -> u32 {
    8
}

fn default_weight() -> u32 {
    1
}

fn default_request_timeout() -> u64 {
    30
}
