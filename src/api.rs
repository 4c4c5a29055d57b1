// api.rs - API服務模組，宣告子模組
//
// 提供示範用的 HTTP 接口，分別以集群、單機與分片三種模式讀寫 Redis。

/// REST API實現
pub mod rest;
/// API路由定義
pub mod routes;
/// API處理器模組
pub mod handlers;
/// 共享狀態
pub mod state;
/// 錯誤響應
pub mod error;

pub use error::ApiError;
pub use state::AppState;
