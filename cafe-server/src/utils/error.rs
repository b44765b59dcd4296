//! 统一错误处理
//!
//! 错误类型定义在 `shared::error`，这里只做 re-export：
//! - [`AppError`] - 应用错误 (错误码 + 消息 + 详情)
//! - [`ApiResponse`] - 统一响应结构
//!
//! 领域错误 (`PointsError`, `SettlementError`, `RepoError`) 各自实现
//! `From<_> for AppError`，交给上层处理器按 `http_status()` 输出。

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
