//! Order lookups: header + items + menu names

use super::error::{SettlementError, SettlementResult};
use crate::db::repository::{menu_item, order as order_repo};
use shared::models::{Order, OrderDetail, OrderItemDetail};
use sqlx::SqlitePool;

/// Order with its lines, by id
pub async fn find_detail(pool: &SqlitePool, order_id: i64) -> SettlementResult<OrderDetail> {
    let order = order_repo::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.to_string()))?;
    compose(pool, order).await
}

/// Order with its lines, by order number
pub async fn find_by_number(pool: &SqlitePool, order_number: &str) -> SettlementResult<OrderDetail> {
    let order = order_repo::find_by_number(pool, order_number)
        .await?
        .ok_or_else(|| SettlementError::OrderNotFound(order_number.to_string()))?;
    compose(pool, order).await
}

/// Most recent order for a pickup code
///
/// Pickup codes repeat across serving windows; the newest order wins.
pub async fn find_by_pickup_code(pool: &SqlitePool, code: &str) -> SettlementResult<OrderDetail> {
    let order = order_repo::find_latest_by_pickup_code(pool, code)
        .await?
        .ok_or_else(|| SettlementError::OrderNotFound(code.to_string()))?;
    compose(pool, order).await
}

async fn compose(pool: &SqlitePool, order: Order) -> SettlementResult<OrderDetail> {
    let items = order_repo::find_items(pool, order.id).await?;

    let mut ids: Vec<i64> = items.iter().map(|i| i.menu_item_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let names = menu_item::find_names(pool, &ids).await?;

    let items = items
        .into_iter()
        .map(|item| OrderItemDetail {
            menu_name: names.get(&item.menu_item_id).cloned(),
            item,
        })
        .collect();

    Ok(OrderDetail { order, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::order::NewOrder;
    use rust_decimal::Decimal;
    use shared::models::{MembershipTier, MenuItemCreate};

    async fn seed(db: &DbService) -> Order {
        let latte = menu_item::create(
            &db.pool,
            MenuItemCreate {
                name: "Latte".into(),
                price: Decimal::new(450, 2),
                category: None,
                is_available: None,
            },
        )
        .await
        .unwrap();

        let mut tx = db.pool.begin().await.unwrap();
        let order = order_repo::insert(
            &mut tx,
            &NewOrder {
                customer_id: Some(5),
                order_number: "CO202601010042",
                pickup_code: "J042",
                original_total_price: Decimal::new(1350, 2),
                points_deduction_amount: Decimal::ZERO,
                final_payment_amount: Decimal::new(1350, 2),
                points_used: 0,
                points_earned: 13,
                member_level_at_time: MembershipTier::Bronze,
                notes: None,
            },
        )
        .await
        .unwrap();
        order_repo::insert_item(&mut tx, order.id, latte.id, 2, Decimal::new(450, 2), Decimal::new(900, 2))
            .await
            .unwrap();
        // item whose menu entry no longer exists
        order_repo::insert_item(&mut tx, order.id, 999, 1, Decimal::new(450, 2), Decimal::new(450, 2))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        order
    }

    #[tokio::test]
    async fn test_detail_resolves_menu_names() {
        let db = DbService::in_memory().await.unwrap();
        let order = seed(&db).await;

        let detail = find_detail(&db.pool, order.id).await.unwrap();
        assert_eq!(detail.order, order);
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].menu_name.as_deref(), Some("Latte"));
        assert_eq!(detail.items[1].menu_name, None);

        let by_number = find_by_number(&db.pool, "CO202601010042").await.unwrap();
        assert_eq!(by_number, detail);
        let by_code = find_by_pickup_code(&db.pool, "J042").await.unwrap();
        assert_eq!(by_code.order.id, order.id);
    }

    #[tokio::test]
    async fn test_missing_order() {
        let db = DbService::in_memory().await.unwrap();
        assert!(matches!(
            find_detail(&db.pool, 1).await,
            Err(SettlementError::OrderNotFound(_))
        ));
        assert!(matches!(
            find_by_pickup_code(&db.pool, "Z999").await,
            Err(SettlementError::OrderNotFound(code)) if code == "Z999"
        ));
    }
}
