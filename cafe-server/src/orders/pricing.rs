//! Cart validation and pricing
//!
//! Unit prices come from the catalog unless the caller pinned one from an
//! earlier calculation step. Subtotals are rounded to cents before summing,
//! so the order total always equals the sum of its stored item subtotals.

use super::error::{SettlementError, SettlementResult};
use crate::db::repository::menu_item;
use crate::money::{MAX_PRICE, round_money};
use rust_decimal::Decimal;
use shared::models::{Cart, CartLine, MenuItem};
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i32 = 999;

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub menu_item_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub original_total: Decimal,
}

/// Shape checks that need no catalog lookup
pub fn validate_lines(lines: &[CartLine]) -> SettlementResult<()> {
    if lines.is_empty() {
        return Err(SettlementError::EmptyCart);
    }
    for line in lines {
        if !(1..=MAX_QUANTITY).contains(&line.quantity) {
            return Err(SettlementError::InvalidQuantity {
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
            });
        }
        if let Some(price) = line.unit_price
            && (price.is_sign_negative() || price > MAX_PRICE)
        {
            return Err(SettlementError::InvalidUnitPrice {
                menu_item_id: line.menu_item_id,
                unit_price: price,
            });
        }
    }
    Ok(())
}

/// Price validated lines against a catalog snapshot
pub fn price_lines(lines: &[CartLine], catalog: &HashMap<i64, MenuItem>) -> SettlementResult<PricedCart> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut original_total = Decimal::ZERO;

    for line in lines {
        let item = catalog
            .get(&line.menu_item_id)
            .ok_or(SettlementError::ItemNotFound(line.menu_item_id))?;
        if !item.is_available {
            return Err(SettlementError::ItemUnavailable(item.id));
        }

        // A pinned price of zero counts as not pinned
        let pinned = line.unit_price.filter(|p| !p.is_zero());
        let unit_price = round_money(pinned.unwrap_or(item.price));
        let subtotal = round_money(unit_price * Decimal::from(line.quantity));
        original_total += subtotal;
        priced.push(PricedLine {
            menu_item_id: line.menu_item_id,
            quantity: line.quantity,
            unit_price,
            subtotal,
        });
    }

    Ok(PricedCart {
        lines: priced,
        original_total,
    })
}

/// Validate, load the referenced menu items, and price the cart
pub async fn price_cart(pool: &SqlitePool, cart: &Cart) -> SettlementResult<PricedCart> {
    validate_lines(&cart.lines)?;

    let mut ids: Vec<i64> = cart.lines.iter().map(|l| l.menu_item_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let catalog = menu_item::find_by_ids(pool, &ids).await?;

    price_lines(&cart.lines, &catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, cents: i64) -> MenuItem {
        MenuItem {
            id,
            name: format!("item-{id}"),
            price: Decimal::new(cents, 2),
            category: "coffee".into(),
            is_available: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn catalog() -> HashMap<i64, MenuItem> {
        [(1, item(1, 450)), (2, item(2, 1100))].into_iter().collect()
    }

    #[test]
    fn test_price_from_catalog() {
        let lines = vec![CartLine::new(1, 2), CartLine::new(2, 1)];
        let priced = price_lines(&lines, &catalog()).unwrap();
        assert_eq!(priced.original_total, Decimal::new(2000, 2));
        assert_eq!(priced.lines[0].subtotal, Decimal::new(900, 2));
    }

    #[test]
    fn test_pinned_price_overrides_catalog() {
        let lines = vec![CartLine::new(1, 3).with_unit_price(Decimal::new(400, 2))];
        let priced = price_lines(&lines, &catalog()).unwrap();
        assert_eq!(priced.lines[0].unit_price, Decimal::new(400, 2));
        assert_eq!(priced.original_total, Decimal::new(1200, 2));
    }

    #[test]
    fn test_zero_pinned_price_uses_catalog() {
        let lines = vec![CartLine::new(2, 2).with_unit_price(Decimal::ZERO)];
        let priced = price_lines(&lines, &catalog()).unwrap();
        assert_eq!(priced.lines[0].unit_price, Decimal::new(1100, 2));
        assert_eq!(priced.original_total, Decimal::new(2200, 2));
    }

    #[test]
    fn test_total_equals_sum_of_subtotals() {
        // 3 x 3.335 rounds per line first: 3.34 * 3 = 10.02
        let lines = vec![
            CartLine::new(1, 3).with_unit_price(Decimal::new(3335, 3)),
            CartLine::new(2, 1),
        ];
        let priced = price_lines(&lines, &catalog()).unwrap();
        let sum: Decimal = priced.lines.iter().map(|l| l.subtotal).sum();
        assert_eq!(priced.original_total, sum);
        assert_eq!(priced.lines[0].subtotal, Decimal::new(1002, 2));
    }

    #[test]
    fn test_validation_failures() {
        assert!(matches!(validate_lines(&[]), Err(SettlementError::EmptyCart)));
        assert!(matches!(
            validate_lines(&[CartLine::new(1, 0)]),
            Err(SettlementError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(matches!(
            validate_lines(&[CartLine::new(1, MAX_QUANTITY + 1)]),
            Err(SettlementError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            validate_lines(&[CartLine::new(1, 1).with_unit_price(Decimal::new(-1, 2))]),
            Err(SettlementError::InvalidUnitPrice { .. })
        ));
    }

    #[test]
    fn test_missing_and_unavailable_items() {
        let mut catalog = catalog();
        assert!(matches!(
            price_lines(&[CartLine::new(99, 1)], &catalog),
            Err(SettlementError::ItemNotFound(99))
        ));

        if let Some(item) = catalog.get_mut(&2) {
            item.is_available = false;
        }
        assert!(matches!(
            price_lines(&[CartLine::new(2, 1)], &catalog),
            Err(SettlementError::ItemUnavailable(2))
        ));
    }
}
