//! Cafe Server - 咖啡店点单结算核心
//!
//! # 架构概述
//!
//! - **数据库** (`db`): SQLite 连接池、迁移与仓储函数
//! - **会员积分** (`loyalty`): 会员等级引擎与积分账本
//! - **订单** (`orders`): 购物车计价、结算协调、订单状态流转
//! - **金额** (`money`): 金额舍入与分(cents)换算
//!
//! # 模块结构
//!
//! ```text
//! cafe-server/src/
//! ├── core/          # 配置
//! ├── db/            # SQLite + repository
//! ├── loyalty/       # 等级 + 积分账本
//! ├── orders/        # 计价、结算、生命周期
//! ├── money.rs       # 金额工具
//! └── utils/         # 错误、日志
//! ```

pub mod core;
pub mod db;
pub mod loyalty;
pub mod money;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use crate::core::Config;
pub use db::DbService;
pub use loyalty::{MemberLevelEngine, PointsError, PointsLedger};
pub use orders::{SettlementCoordinator, SettlementError};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
