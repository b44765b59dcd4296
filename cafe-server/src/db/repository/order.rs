//! Order Repository
//!
//! Orders and their items are written only inside a settlement transaction.
//! Reads are plain single-table queries; composition (order -> items -> menu
//! names) happens in the caller.

use super::{RepoResult, Tx, cents};
use crate::money::from_cents;
use rust_decimal::Decimal;
use shared::models::{MembershipTier, Order, OrderItem, OrderStatus};
use sqlx::SqlitePool;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_id: Option<i64>,
    order_number: String,
    pickup_code: String,
    status: OrderStatus,
    original_total_cents: i64,
    points_deduction_cents: i64,
    final_payment_cents: i64,
    points_used: i64,
    points_earned: i64,
    member_level_at_time: MembershipTier,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            customer_id: row.customer_id,
            order_number: row.order_number,
            pickup_code: row.pickup_code,
            status: row.status,
            original_total_price: from_cents(row.original_total_cents),
            points_deduction_amount: from_cents(row.points_deduction_cents),
            final_payment_amount: from_cents(row.final_payment_cents),
            points_used: row.points_used,
            points_earned: row.points_earned,
            member_level_at_time: row.member_level_at_time,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    menu_item_id: i64,
    quantity: i32,
    unit_price_cents: i64,
    subtotal_cents: i64,
    created_at: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            menu_item_id: row.menu_item_id,
            quantity: row.quantity,
            unit_price: from_cents(row.unit_price_cents),
            subtotal: from_cents(row.subtotal_cents),
            created_at: row.created_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, order_number, pickup_code, status, original_total_cents, points_deduction_cents, final_payment_cents, points_used, points_earned, member_level_at_time, notes, created_at, updated_at";

/// Order header to insert
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub customer_id: Option<i64>,
    pub order_number: &'a str,
    pub pickup_code: &'a str,
    pub original_total_price: Decimal,
    pub points_deduction_amount: Decimal,
    pub final_payment_amount: Decimal,
    pub points_used: i64,
    pub points_earned: i64,
    pub member_level_at_time: MembershipTier,
    pub notes: Option<&'a str>,
}

/// Insert the order header in `Pending` status
///
/// A clash on `order_number` surfaces as [`RepoError::Duplicate`](super::RepoError::Duplicate).
pub async fn insert(tx: &mut Tx<'_>, data: &NewOrder<'_>) -> RepoResult<Order> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    let status = OrderStatus::Pending;

    sqlx::query(
        "INSERT INTO orders (id, customer_id, order_number, pickup_code, status, original_total_cents, points_deduction_cents, final_payment_cents, points_used, points_earned, member_level_at_time, notes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
    )
    .bind(id)
    .bind(data.customer_id)
    .bind(data.order_number)
    .bind(data.pickup_code)
    .bind(status)
    .bind(cents(data.original_total_price, "original_total_price")?)
    .bind(cents(data.points_deduction_amount, "points_deduction_amount")?)
    .bind(cents(data.final_payment_amount, "final_payment_amount")?)
    .bind(data.points_used)
    .bind(data.points_earned)
    .bind(data.member_level_at_time)
    .bind(data.notes)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(Order {
        id,
        customer_id: data.customer_id,
        order_number: data.order_number.to_string(),
        pickup_code: data.pickup_code.to_string(),
        status,
        original_total_price: data.original_total_price,
        points_deduction_amount: data.points_deduction_amount,
        final_payment_amount: data.final_payment_amount,
        points_used: data.points_used,
        points_earned: data.points_earned,
        member_level_at_time: data.member_level_at_time,
        notes: data.notes.map(str::to_string),
        created_at: now,
        updated_at: now,
    })
}

pub async fn insert_item(
    tx: &mut Tx<'_>,
    order_id: i64,
    menu_item_id: i64,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
) -> RepoResult<OrderItem> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO order_item (order_id, menu_item_id, quantity, unit_price_cents, subtotal_cents, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
    )
    .bind(order_id)
    .bind(menu_item_id)
    .bind(quantity)
    .bind(cents(unit_price, "unit_price")?)
    .bind(cents(subtotal, "subtotal")?)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(OrderItem {
        id,
        order_id,
        menu_item_id,
        quantity,
        unit_price,
        subtotal,
        created_at: now,
    })
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Order::from))
}

pub async fn find_by_number(pool: &SqlitePool, order_number: &str) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?"
    ))
    .bind(order_number)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Order::from))
}

/// Most recent order carrying this pickup code
pub async fn find_latest_by_pickup_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE pickup_code = ? ORDER BY created_at DESC, id DESC LIMIT 1"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Order::from))
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, menu_item_id, quantity, unit_price_cents, subtotal_cents, created_at FROM order_item WHERE order_id = ? ORDER BY id ASC",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(OrderItem::from).collect())
}

/// Move status only if it is still `from`; returns false on a lost race
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let result = sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4")
        .bind(to)
        .bind(now)
        .bind(id)
        .bind(from)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
