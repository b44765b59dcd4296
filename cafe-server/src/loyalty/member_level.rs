//! Member Level Engine
//!
//! Pure mapping from lifetime points to a tier and from a tier to its rates,
//! evaluated against a snapshot of the active tier configuration.

use super::error::{PointsError, PointsResult};
use crate::db::repository::member_level;
use shared::models::{MembershipTier, NextTierInfo, TierConfig, TierRates};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct MemberLevelEngine {
    /// Active tiers, ascending `min_points`
    tiers: Vec<TierConfig>,
}

impl MemberLevelEngine {
    pub fn new(mut tiers: Vec<TierConfig>) -> Self {
        tiers.retain(|t| t.is_active);
        tiers.sort_by_key(|t| (t.min_points, t.sort_order));
        Self { tiers }
    }

    /// Load the active tier configuration
    pub async fn load(pool: &SqlitePool) -> PointsResult<Self> {
        let tiers = member_level::find_active(pool).await?;
        if tiers.is_empty() {
            tracing::warn!("No active tier configuration rows; every rate lookup will fail");
        }
        Ok(Self::new(tiers))
    }

    /// Highest tier whose threshold is met; the lowest tier when none is
    pub fn tier_for(&self, lifetime_points: i64) -> MembershipTier {
        self.tiers
            .iter()
            .rev()
            .find(|t| lifetime_points >= t.min_points)
            .map(|t| t.tier)
            .unwrap_or_else(MembershipTier::lowest)
    }

    pub fn rate_for(&self, tier: MembershipTier) -> PointsResult<TierRates> {
        self.config(tier)
            .map(|t| TierRates {
                earning_multiplier: t.earning_multiplier,
                max_discount_percentage: t.max_discount_percentage,
            })
            .ok_or(PointsError::ConfigMissing(tier))
    }

    /// Next tier above `tier` and the lifetime points still needed to reach it
    pub fn next_tier(&self, tier: MembershipTier, lifetime_points: i64) -> Option<NextTierInfo> {
        self.tiers
            .iter()
            .find(|t| t.tier > tier && t.min_points > lifetime_points)
            .map(|t| NextTierInfo {
                tier: t.tier,
                display_name: t.display_name.clone(),
                required_points: t.min_points,
                points_needed: t.min_points - lifetime_points,
            })
    }

    pub fn config(&self, tier: MembershipTier) -> Option<&TierConfig> {
        self.tiers.iter().find(|t| t.tier == tier)
    }

    pub fn tiers(&self) -> &[TierConfig] {
        &self.tiers
    }
}
