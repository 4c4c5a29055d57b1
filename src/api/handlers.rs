pub mod cluster;
pub mod pool;
pub mod sharded;
pub mod system;

use serde::Deserialize;

/// 可選的 `?key=&value=` 查詢參數
#[derive(Debug, Default, Deserialize)]
pub struct KeyValueQuery {
    pub key: Option<String>,
    pub value: Option<String>,
}

impl KeyValueQuery {
    pub fn key_or(&self, default: &str) -> String {
        self.key.clone().unwrap_or_else(|| default.to_string())
    }

    pub fn value_or(&self, default: &str) -> String {
        self.value.clone().unwrap_or_else(|| default.to_string())
    }
}
