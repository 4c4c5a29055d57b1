use crate::api::ApiError;
use crate::config::RedisSettings;
use crate::redis::{ClientMode, Deployment, RedisUtil};

/// 各處理器共享的狀態，未配置的模式為 `None`
#[derive(Clone, Default)]
pub struct AppState {
    cluster: Option<RedisUtil>,
    single: Option<RedisUtil>,
    sharded: Option<RedisUtil>,
}

impl AppState {
    pub fn new(deployment: &Deployment, settings: &RedisSettings) -> Self {
        let util = |mode| {
            deployment
                .client(mode)
                .map(|client| RedisUtil::with_settings(client, settings))
        };

        Self {
            cluster: util(ClientMode::Cluster),
            single: util(ClientMode::Single),
            sharded: util(ClientMode::Sharded),
        }
    }

    /// 指定模式的門面，未配置時返回 503
    pub fn util(&self, mode: ClientMode) -> Result<&RedisUtil, ApiError> {
        let util = match mode {
            ClientMode::Cluster => self.cluster.as_ref(),
            ClientMode::Single => self.single.as_ref(),
            ClientMode::Sharded => self.sharded.as_ref(),
        };
        util.ok_or(ApiError::Unavailable(mode))
    }

    /// 已配置的模式
    pub fn modes(&self) -> Vec<ClientMode> {
        [ClientMode::Cluster, ClientMode::Single, ClientMode::Sharded]
            .into_iter()
            .filter(|mode| self.util(*mode).is_ok())
            .collect()
    }
}
