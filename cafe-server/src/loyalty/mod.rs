//! Loyalty: membership tiers and the points ledger
//!
//! ```text
//! PointsLedger ──> MemberLevelEngine ──> member_level (tier config rows)
//!      │
//!      └──> points_account + point_transaction (one row per mutation)
//! ```

pub mod error;
pub mod ledger;
pub mod member_level;

pub use error::{PointsError, PointsResult};
pub use ledger::{
    EarnOutcome, MIN_REDEMPTION_POINTS, POINTS_PER_CURRENCY_UNIT, PointsLedger, SIGNUP_BONUS_POINTS,
};
pub use member_level::MemberLevelEngine;
