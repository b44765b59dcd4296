//! Points Account Repository
//!
//! Balance mutations are single-statement and atomic; the ledger layer pairs
//! each with exactly one ledger row inside the same transaction.

use super::{RepoError, RepoResult, Tx};
use shared::models::{MembershipTier, PointsAccount};
use sqlx::sqlite::SqliteExecutor;

const COLUMNS: &str =
    "customer_id, balance, lifetime_points, tier, tier_upgraded_at, created_at, updated_at";

pub async fn find<'e, E>(executor: E, customer_id: i64) -> RepoResult<Option<PointsAccount>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, PointsAccount>(&format!(
        "SELECT {COLUMNS} FROM points_account WHERE customer_id = ?"
    ))
    .bind(customer_id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Create a zero-balance account if none exists; returns true when created
pub async fn ensure(tx: &mut Tx<'_>, customer_id: i64, tier: MembershipTier) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    // INSERT OR IGNORE: one account per customer
    let result = sqlx::query(
        "INSERT OR IGNORE INTO points_account (customer_id, balance, lifetime_points, tier, created_at, updated_at) VALUES (?1, 0, 0, ?2, ?3, ?3)",
    )
    .bind(customer_id)
    .bind(tier)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Post-credit account state
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct CreditedBalance {
    pub balance: i64,
    pub lifetime_points: i64,
    pub tier: MembershipTier,
}

/// Add to balance and lifetime points in one statement
pub async fn credit(tx: &mut Tx<'_>, customer_id: i64, points: i64) -> RepoResult<CreditedBalance> {
    let now = shared::util::now_millis();
    sqlx::query_as::<_, CreditedBalance>(
        "UPDATE points_account SET balance = balance + ?1, lifetime_points = lifetime_points + ?1, updated_at = ?2 WHERE customer_id = ?3 RETURNING balance, lifetime_points, tier",
    )
    .bind(points)
    .bind(now)
    .bind(customer_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| RepoError::NotFound(format!("points account {customer_id}")))
}

/// Compare-and-set debit
///
/// Returns the new balance, or `None` when the account is missing or holds
/// fewer than `points`. Never drives the balance negative.
pub async fn debit(tx: &mut Tx<'_>, customer_id: i64, points: i64) -> RepoResult<Option<i64>> {
    let now = shared::util::now_millis();
    let balance = sqlx::query_scalar::<_, i64>(
        "UPDATE points_account SET balance = balance - ?1, updated_at = ?2 WHERE customer_id = ?3 AND balance >= ?1 RETURNING balance",
    )
    .bind(points)
    .bind(now)
    .bind(customer_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(balance)
}

pub async fn set_tier(
    tx: &mut Tx<'_>,
    customer_id: i64,
    tier: MembershipTier,
    changed_at: i64,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE points_account SET tier = ?1, tier_upgraded_at = ?2, updated_at = ?2 WHERE customer_id = ?3",
    )
    .bind(tier)
    .bind(changed_at)
    .bind(customer_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
