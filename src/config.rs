/// 配置管理模組
///
/// 本模組負責加載、驗證和管理系統配置。
/// 配置來自 `config/<env>.toml`，並可由 `REDIS_STARTER__` 前綴的環境變數覆寫。
pub mod loader;
pub mod manager;
pub mod types;
pub mod validation;

// 重新導出常用組件
pub use loader::{ConfigLoader, Environment};
pub use manager::{init_config_from, LoadError};
pub use types::*;
pub use validation::{ValidationError, ValidationUtils, Validator};
