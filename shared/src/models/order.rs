//! Order Model

use super::member_level::MembershipTier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order lifecycle status (订单状态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Forward-only lifecycle; cancellation allowed until completion
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::Pending, OrderStatus::Preparing)
            | (OrderStatus::Preparing, OrderStatus::Ready)
            | (OrderStatus::Ready, OrderStatus::Completed) => true,
            (OrderStatus::Pending | OrderStatus::Preparing | OrderStatus::Ready, OrderStatus::Cancelled) => true,
            _ => false,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Persisted order (订单)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// None = guest order
    pub customer_id: Option<i64>,
    pub order_number: String,
    pub pickup_code: String,
    pub status: OrderStatus,
    /// Sum of item subtotals, before redemption
    pub original_total_price: Decimal,
    pub points_deduction_amount: Decimal,
    /// original_total_price - points_deduction_amount
    pub final_payment_amount: Decimal,
    pub points_used: i64,
    pub points_earned: i64,
    /// Tier snapshot at creation time
    pub member_level_at_time: MembershipTier,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Persisted order line (订单项)
///
/// `unit_price` is a historical snapshot, immune to later menu price changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub created_at: i64,
}

/// Order line with the menu item name resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub menu_name: Option<String>,
}

/// Order with its lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

// =============================================================================
// Settlement inputs / outputs
// =============================================================================

/// One cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub menu_item_id: i64,
    pub quantity: i32,
    /// Price pinned by a prior calculation step; catalog price when absent
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

impl CartLine {
    pub fn new(menu_item_id: i64, quantity: i32) -> Self {
        Self {
            menu_item_id,
            quantity,
            unit_price: None,
        }
    }

    pub fn with_unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = Some(unit_price);
        self
    }
}

/// Cart submitted for settlement or quote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Cart {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self { lines, notes: None }
    }
}

/// Points the customer asked to redeem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub points: i64,
}

impl RedemptionRequest {
    pub const fn none() -> Self {
        Self { points: 0 }
    }

    pub const fn points(points: i64) -> Self {
        Self { points }
    }
}

/// Order summary returned by a committed settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub order_number: String,
    pub pickup_code: String,
    pub status: OrderStatus,
    pub original_total_price: Decimal,
    pub points_deduction_amount: Decimal,
    pub final_payment_amount: Decimal,
    pub member_level_at_time: MembershipTier,
    pub created_at: i64,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            pickup_code: order.pickup_code.clone(),
            status: order.status,
            original_total_price: order.original_total_price,
            points_deduction_amount: order.points_deduction_amount,
            final_payment_amount: order.final_payment_amount,
            member_level_at_time: order.member_level_at_time,
            created_at: order.created_at,
        }
    }
}

/// Result of a committed settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub order: OrderSummary,
    pub points_used: i64,
    pub points_earned: i64,
}

/// Read-only redemption preview (积分使用预估)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsQuote {
    pub original_total: Decimal,
    pub max_usable_points: i64,
    pub points_to_use: i64,
    pub points_value: Decimal,
    pub final_total: Decimal,
    pub estimated_points_earned: i64,
    pub balance: i64,
    pub balance_after_usage: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Ready));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_cancellation_until_completed() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Completed.is_terminal());
    }

    #[test]
    fn test_cart_line_pinned_price_defaults() {
        let line: CartLine = serde_json::from_str(r#"{"menu_item_id":1,"quantity":2}"#).unwrap();
        assert_eq!(line, CartLine::new(1, 2));
    }
}
