use redis_starter::config::RedisSettings;
use redis_starter::redis::{Deployment, RedisFactory};

/// 測試用的 Redis 地址，優先使用 REDIS_TEST_HOST / REDIS_TEST_PORT
#[allow(dead_code)]
pub fn test_settings() -> RedisSettings {
    let host = std::env::var("REDIS_TEST_HOST").unwrap_or_else(|_| {
        // Docker 環境使用服務名稱 "redis"
        if std::path::Path::new("/.dockerenv").exists() {
            "redis".to_string()
        } else {
            "127.0.0.1".to_string()
        }
    });
    let port = std::env::var("REDIS_TEST_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(6379);

    let mut settings = RedisSettings::standalone(&host, port);
    settings.timeout_ms = 2_000;
    settings.pool.max_active = 4;
    settings.pool.max_wait_ms = 2_000;
    settings
}

/// 連接測試用的 Redis，不可用時返回 None 並跳過測試
#[allow(dead_code)]
pub async fn setup_test_redis(test_name: &str) -> Option<(Deployment, RedisSettings)> {
    let settings = test_settings();
    match RedisFactory::connect(&settings).await {
        Ok(deployment) => Some((deployment, settings)),
        Err(e) => {
            eprintln!("跳過測試 '{}' - Redis 環境不可用: {}", test_name, e);
            None
        }
    }
}

/// 每個測試使用獨立的鍵前綴
#[allow(dead_code)]
pub fn unique_key(prefix: &str) -> String {
    format!("redis_starter_test:{}:{}", prefix, uuid::Uuid::new_v4())
}
