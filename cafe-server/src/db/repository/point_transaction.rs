//! Point Transaction (ledger) Repository
//!
//! Append-only: there is no update or delete.

use super::{RepoError, RepoResult, Tx};
use shared::models::{PointTransaction, PointTransactionView, TransactionKind};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteExecutor;

/// Ledger row to append
#[derive(Debug, Clone)]
pub struct NewPointTransaction<'a> {
    pub customer_id: i64,
    pub order_id: Option<i64>,
    pub kind: TransactionKind,
    pub points_change: i64,
    pub balance_after: i64,
    pub description: &'a str,
}

pub async fn append(tx: &mut Tx<'_>, entry: NewPointTransaction<'_>) -> RepoResult<PointTransaction> {
    if entry.balance_after < 0 {
        return Err(RepoError::Validation(format!(
            "balance_after must be non-negative, got {}",
            entry.balance_after
        )));
    }
    let now = shared::util::now_millis();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO point_transaction (customer_id, order_id, kind, points_change, balance_after, description, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id",
    )
    .bind(entry.customer_id)
    .bind(entry.order_id)
    .bind(entry.kind)
    .bind(entry.points_change)
    .bind(entry.balance_after)
    .bind(entry.description)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(PointTransaction {
        id,
        customer_id: entry.customer_id,
        order_id: entry.order_id,
        kind: entry.kind,
        points_change: entry.points_change,
        balance_after: entry.balance_after,
        description: entry.description.to_string(),
        created_at: now,
    })
}

/// Full ledger in append order
pub async fn find_by_customer(pool: &SqlitePool, customer_id: i64) -> RepoResult<Vec<PointTransaction>> {
    let rows = sqlx::query_as::<_, PointTransaction>(
        "SELECT id, customer_id, order_id, kind, points_change, balance_after, description, created_at FROM point_transaction WHERE customer_id = ? ORDER BY id ASC",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn exists_kind<'e, E>(executor: E, customer_id: i64, kind: TransactionKind) -> RepoResult<bool>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM point_transaction WHERE customer_id = ? AND kind = ?",
    )
    .bind(customer_id)
    .bind(kind)
    .fetch_one(executor)
    .await?;
    Ok(count > 0)
}

/// One page of history, newest first, with the order number joined in
pub async fn find_page(
    pool: &SqlitePool,
    customer_id: i64,
    kind: Option<TransactionKind>,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<PointTransactionView>, i64)> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM point_transaction WHERE customer_id = ?1 AND (?2 IS NULL OR kind = ?2)",
    )
    .bind(customer_id)
    .bind(kind)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, PointTransactionView>(
        "SELECT pt.id, pt.kind, pt.points_change, pt.balance_after, pt.description, pt.order_id, o.order_number, pt.created_at FROM point_transaction pt LEFT JOIN orders o ON o.id = pt.order_id WHERE pt.customer_id = ?1 AND (?2 IS NULL OR pt.kind = ?2) ORDER BY pt.id DESC LIMIT ?3 OFFSET ?4",
    )
    .bind(customer_id)
    .bind(kind)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}
