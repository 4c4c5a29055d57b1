//! 集中化的 Redis 測試配置
//!
//! 提供一致的測試環境配置，支援不同部署環境（本地開發、Docker 容器）

use crate::config::types::RedisSettings;
use crate::redis::pool::{RedisPool, RedisPoolError, SinglePool};
use deadpool_redis::redis::IntoConnectionInfo;
use tracing::warn;

/// Redis 測試配置建構器
pub struct RedisTestConfig;

impl RedisTestConfig {
    /// 獲取測試用 Redis URL
    ///
    /// 優先級：
    /// 1. REDIS_TEST_URL 環境變數
    /// 2. 檢測 Docker 環境使用 redis:6379
    /// 3. 預設 localhost:6379
    pub fn get_test_url() -> String {
        if let Ok(url) = std::env::var("REDIS_TEST_URL") {
            return url;
        }

        if Self::is_docker_environment() {
            "redis://redis:6379".to_string()
        } else {
            "redis://localhost:6379".to_string()
        }
    }

    fn is_docker_environment() -> bool {
        std::env::var("DOCKER_CONTAINER").is_ok() || std::path::Path::new("/.dockerenv").exists()
    }

    /// 測試用的小型連接池配置，等待與連接超時都很短
    pub fn create_test_settings() -> RedisSettings {
        let mut settings = RedisSettings::standalone("localhost", 6379);
        settings.timeout_ms = 2_000;
        settings.pool.max_active = 3;
        settings.pool.max_wait_ms = 2_000;
        settings
    }

    /// 建立測試用 Redis 連接池
    pub fn create_test_pool() -> Result<SinglePool, RedisPoolError> {
        let info = Self::get_test_url().into_connection_info()?;
        SinglePool::new(info, &Self::create_test_settings())
    }

    /// Redis 可用時返回連接池，否則記錄並跳過測試
    pub async fn skip_if_redis_unavailable(test_name: &str) -> Option<SinglePool> {
        match Self::create_test_pool() {
            Ok(pool) if pool.check_health().await => Some(pool),
            _ => {
                warn!("跳過測試 '{}' - Redis 環境不可用", test_name);
                eprintln!("跳過測試 '{}' - Redis 環境不可用", test_name);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_get_test_url_with_env_var() {
        let previous = std::env::var("REDIS_TEST_URL").ok();
        std::env::set_var("REDIS_TEST_URL", "redis://custom:1234");

        assert_eq!(RedisTestConfig::get_test_url(), "redis://custom:1234");

        match previous {
            Some(url) => std::env::set_var("REDIS_TEST_URL", url),
            None => std::env::remove_var("REDIS_TEST_URL"),
        }
    }

    #[test]
    fn test_create_test_settings() {
        let settings = RedisTestConfig::create_test_settings();
        assert_eq!(settings.pool.max_active, 3);
        assert_eq!(settings.timeout_ms, 2_000);
    }
}
