//! Points Account & Ledger Models

use super::member_level::{MembershipTier, NextTierInfo, TierRates};
use serde::{Deserialize, Serialize};

/// Ledger entry kind (积分交易类型)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum TransactionKind {
    Earned,
    Used,
    SignupBonus,
    BirthdayBonus,
    ReferralBonus,
    Expired,
    Refunded,
}

impl TransactionKind {
    /// Whether entries of this kind add to the balance
    pub const fn is_credit(&self) -> bool {
        match self {
            TransactionKind::Earned
            | TransactionKind::SignupBonus
            | TransactionKind::BirthdayBonus
            | TransactionKind::ReferralBonus
            | TransactionKind::Refunded => true,
            TransactionKind::Used | TransactionKind::Expired => false,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Earned => "earned",
            TransactionKind::Used => "used",
            TransactionKind::SignupBonus => "signup_bonus",
            TransactionKind::BirthdayBonus => "birthday_bonus",
            TransactionKind::ReferralBonus => "referral_bonus",
            TransactionKind::Expired => "expired",
            TransactionKind::Refunded => "refunded",
        }
    }
}

/// Points account (用户积分账户), one per customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PointsAccount {
    pub customer_id: i64,
    /// Current balance, never negative
    pub balance: i64,
    /// Points ever earned; redemption never lowers it
    pub lifetime_points: i64,
    pub tier: MembershipTier,
    /// Last tier change (Unix millis)
    pub tier_upgraded_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Ledger entry (积分变动记录), immutable once written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PointTransaction {
    pub id: i64,
    pub customer_id: i64,
    pub order_id: Option<i64>,
    pub kind: TransactionKind,
    /// Signed delta: positive credits, negative debits
    pub points_change: i64,
    /// Balance right after this entry was applied
    pub balance_after: i64,
    pub description: String,
    pub created_at: i64,
}

/// Ledger entry with its owning order number joined in (history view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PointTransactionView {
    pub id: i64,
    pub kind: TransactionKind,
    pub points_change: i64,
    pub balance_after: i64,
    pub description: String,
    pub order_id: Option<i64>,
    pub order_number: Option<String>,
    pub created_at: i64,
}

/// Page of ledger history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointTransactionPage {
    pub transactions: Vec<PointTransactionView>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub pages: i64,
}

/// Account overview (积分信息)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsSummary {
    pub balance: i64,
    pub lifetime_points: i64,
    pub tier: MembershipTier,
    pub rates: TierRates,
    pub next_tier: Option<NextTierInfo>,
}
