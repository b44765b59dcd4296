//! Order status lifecycle
//!
//! `pending -> preparing -> ready -> completed`, with cancellation allowed
//! from any non-terminal state. Cancelling does not touch the points ledger.

use super::error::{SettlementError, SettlementResult};
use crate::db::repository::order as order_repo;
use shared::models::{Order, OrderStatus};
use sqlx::SqlitePool;

/// Move an order to `next` if the lifecycle allows it
///
/// The write is a compare-and-set on the current status, so two staff
/// members advancing the same order cannot both succeed.
pub async fn update_status(pool: &SqlitePool, order_id: i64, next: OrderStatus) -> SettlementResult<Order> {
    let order = find(pool, order_id).await?;
    let current = order.status;

    if !current.can_transition_to(next) {
        return Err(SettlementError::InvalidStatusTransition { from: current, to: next });
    }

    if !order_repo::update_status(pool, order_id, current, next).await? {
        // Someone else moved it first; report against what is stored now
        let latest = find(pool, order_id).await?;
        tracing::debug!(order_id, from = ?current, to = ?next, actual = ?latest.status, "Lost status race");
        return Err(SettlementError::InvalidStatusTransition {
            from: latest.status,
            to: next,
        });
    }

    tracing::info!(
        order_number = %order.order_number,
        from = current.as_str(),
        to = next.as_str(),
        "Order status updated"
    );
    find(pool, order_id).await
}

async fn find(pool: &SqlitePool, order_id: i64) -> SettlementResult<Order> {
    order_repo::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.to_string()))
}
