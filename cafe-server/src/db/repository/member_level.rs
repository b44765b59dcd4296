//! Member Level (tier config) Repository
//!
//! Reference data seeded by migration.

use super::{RepoError, RepoResult};
use crate::money::parse_rate;
use shared::models::{MembershipTier, TierConfig};
use sqlx::SqlitePool;

#[derive(sqlx::FromRow)]
struct MemberLevelRow {
    tier: MembershipTier,
    display_name: String,
    min_points: i64,
    earning_multiplier: String,
    max_discount_percentage: String,
    is_active: bool,
    sort_order: i32,
}

impl TryFrom<MemberLevelRow> for TierConfig {
    type Error = RepoError;

    fn try_from(row: MemberLevelRow) -> Result<Self, Self::Error> {
        let earning_multiplier = parse_rate(&row.earning_multiplier).map_err(|e| {
            RepoError::Validation(format!("{}: invalid earning_multiplier: {e}", row.tier))
        })?;
        let max_discount_percentage = parse_rate(&row.max_discount_percentage).map_err(|e| {
            RepoError::Validation(format!("{}: invalid max_discount_percentage: {e}", row.tier))
        })?;
        Ok(TierConfig {
            tier: row.tier,
            display_name: row.display_name,
            min_points: row.min_points,
            earning_multiplier,
            max_discount_percentage,
            is_active: row.is_active,
            sort_order: row.sort_order,
        })
    }
}

/// Active tiers, ascending threshold
pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<TierConfig>> {
    let rows = sqlx::query_as::<_, MemberLevelRow>(
        "SELECT tier, display_name, min_points, earning_multiplier, max_discount_percentage, is_active, sort_order FROM member_level WHERE is_active = 1 ORDER BY min_points ASC, sort_order ASC",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(TierConfig::try_from).collect()
}

/// Test-only switch for simulating missing tier config
#[cfg(test)]
pub async fn set_active(pool: &SqlitePool, tier: MembershipTier, is_active: bool) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE member_level SET is_active = ? WHERE tier = ?")
        .bind(is_active)
        .bind(tier)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
