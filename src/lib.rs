// 模組定義
pub mod api;
pub mod config;
pub mod redis;
