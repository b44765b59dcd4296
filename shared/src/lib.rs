//! Shared types for the cafe ordering backend
//!
//! Domain models, the unified error system and small utilities used by
//! `cafe-server` and by any surface that serializes its results.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
