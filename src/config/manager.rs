use crate::config::loader::{ConfigLoader, Environment};
use crate::config::types::ApplicationConfig;
use crate::config::validation::{ValidationError, Validator};
use config::ConfigError;
use once_cell::sync::OnceCell;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

// 全局配置實例
static CONFIG: OnceCell<ApplicationConfig> = OnceCell::new();

/// 配置加載錯誤
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("配置讀取失敗: {0}")]
    Source(#[from] ConfigError),

    #[error("配置驗證失敗: {0}")]
    Invalid(#[from] ValidationError),
}

/// 以指定目錄與環境初始化全局配置（在應用程序啟動時調用），返回已生效的配置
pub fn init_config_from(dir: &Path, env: Environment) -> Result<&'static ApplicationConfig, LoadError> {
    if let Some(existing) = CONFIG.get() {
        warn!("配置已經被初始化，跳過重複初始化");
        return Ok(existing);
    }

    let app_config = ApplicationConfig::load_from(dir, env)?;
    debug!("配置初始化成功，環境：{:?}", env);

    Ok(CONFIG.get_or_init(|| app_config))
}

impl ApplicationConfig {
    /// 從指定目錄加載並驗證配置
    pub fn load_from(dir: &Path, env: Environment) -> Result<Self, LoadError> {
        let config_source = ConfigLoader::load_from(dir, env)?;
        let app_config: ApplicationConfig = config_source.try_deserialize()?;

        // 配置錯誤必須在啟動時失敗，不能靜默使用預設值
        app_config.validate()?;
        debug!("配置驗證通過");

        Ok(app_config)
    }
}
