//! Orders: cart pricing, settlement and lifecycle
//!
//! # 结构
//!
//! ```text
//! Cart ──> pricing ──> SettlementCoordinator::prepare ──> SettlementPlan
//!                                                     │
//!                        SettlementCoordinator::commit ┘──> SettlementReceipt
//!
//! detail     read composition (order + items + menu names)
//! lifecycle  status transitions after settlement
//! ```

pub mod detail;
pub mod error;
pub mod identifier;
pub mod lifecycle;
pub mod pricing;
pub mod settlement;

pub use error::{SettlementError, SettlementResult};
pub use identifier::{IdentifierGenerator, OrderNumberSource};
pub use pricing::{PricedCart, PricedLine};
pub use settlement::{SettlementCoordinator, SettlementPlan};
