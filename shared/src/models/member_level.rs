//! Membership Tier Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Membership tier (会员等级)
///
/// Ordered from lowest to highest, so `Ord` follows the tier ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum MembershipTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl MembershipTier {
    /// All tiers, lowest first
    pub const ALL: [MembershipTier; 4] = [
        MembershipTier::Bronze,
        MembershipTier::Silver,
        MembershipTier::Gold,
        MembershipTier::Platinum,
    ];

    /// Tier assigned to guests and to freshly opened accounts
    pub const fn lowest() -> Self {
        MembershipTier::Bronze
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            MembershipTier::Bronze => "bronze",
            MembershipTier::Silver => "silver",
            MembershipTier::Gold => "gold",
            MembershipTier::Platinum => "platinum",
        }
    }
}

impl Default for MembershipTier {
    fn default() -> Self {
        Self::lowest()
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown tier identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown membership tier: {0}")]
pub struct UnknownTier(pub String);

impl FromStr for MembershipTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(MembershipTier::Bronze),
            "silver" => Ok(MembershipTier::Silver),
            "gold" => Ok(MembershipTier::Gold),
            "platinum" => Ok(MembershipTier::Platinum),
            other => Err(UnknownTier(other.to_string())),
        }
    }
}

/// Tier configuration row (会员等级配置)
///
/// Reference data: thresholds and rates that parameterize point math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub tier: MembershipTier,
    pub display_name: String,
    /// Minimum lifetime points to qualify
    pub min_points: i64,
    /// Multiplier applied to base accrual (1.5 = 150%)
    pub earning_multiplier: Decimal,
    /// Max share of an order payable with points (20 = 20%)
    pub max_discount_percentage: Decimal,
    pub is_active: bool,
    pub sort_order: i32,
}

/// Rates looked up for a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRates {
    pub earning_multiplier: Decimal,
    pub max_discount_percentage: Decimal,
}

/// Next tier progress (下一等级信息)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextTierInfo {
    pub tier: MembershipTier,
    pub display_name: String,
    pub required_points: i64,
    pub points_needed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(MembershipTier::Bronze < MembershipTier::Silver);
        assert!(MembershipTier::Gold < MembershipTier::Platinum);
        assert_eq!(MembershipTier::default(), MembershipTier::Bronze);
    }

    #[test]
    fn test_tier_parse() {
        for tier in MembershipTier::ALL {
            assert_eq!(tier.as_str().parse::<MembershipTier>(), Ok(tier));
        }
        assert!("diamond".parse::<MembershipTier>().is_err());
    }

    #[test]
    fn test_tier_serde_lowercase() {
        let json = serde_json::to_string(&MembershipTier::Gold).unwrap();
        assert_eq!(json, "\"gold\"");
    }
}
