use anyhow::{anyhow, Result};
use clap::Parser;
use redis_starter::api::{rest::RestApi, AppState};
use redis_starter::config::{self, ConfigLoader, Environment, LogConfig};
use redis_starter::redis::RedisFactory;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "redis_starter", about = "Redis 集群、單機與分片連接示範服務")]
struct Cli {
    /// 配置目錄，預設為 CONFIG_DIR 或 ./config
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// 運行環境 (development 或 production)，預設為 REDIS_STARTER_ENV
    #[arg(long)]
    env: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化配置
    let config_dir = cli.config_dir.unwrap_or_else(ConfigLoader::config_dir);
    let env = cli
        .env
        .as_deref()
        .map(Environment::parse)
        .unwrap_or_else(Environment::from_env);
    let app_config = config::init_config_from(&config_dir, env)?;

    // 初始化日誌系統，guard 需存活至進程結束
    let _guard = init_logging(&app_config.log)?;
    info!(env = ?env, config_dir = %config_dir.display(), "配置加載完成");

    // 建立 Redis 連接池，任何配置或連接錯誤都在此終止啟動
    let deployment = RedisFactory::connect(&app_config.redis)
        .await
        .map_err(|e| anyhow!("Redis初始化失敗: {}", e))?;
    let state = AppState::new(&deployment, &app_config.redis);

    info!("伺服器初始化完成，監聽端口: {}", app_config.server.port);

    let rest_api = RestApi::new(app_config.server.clone(), state);
    rest_api.start(shutdown_signal()).await?;

    info!("服務已停止");
    Ok(())
}

// 等待關閉信號
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("接收到關閉信號，正在退出..."),
        Err(err) => error!("無法監聽關閉信號: {}", err),
    }
}

// 初始化日誌系統
fn init_logging(log_config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let level = log_config.level.to_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},redis_starter={}", level, level)));

    let stdout_layer = match log_config.format.to_lowercase().as_str() {
        "json" => fmt::layer().json().boxed(),
        _ => fmt::layer().boxed(),
    };

    let (file_layer, guard) = match &log_config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "redis_starter.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    info!("日誌系統初始化完成");
    Ok(guard)
}
