//! Data models
//!
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`;
//! money-bearing rows are mapped by hand in the server's repositories since
//! amounts are stored as integer cents.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod member_level;
pub mod menu_item;
pub mod order;
pub mod points;

// Re-exports
pub use member_level::*;
pub use menu_item::*;
pub use order::*;
pub use points::*;
