use crate::db::repository::RepoError;
use crate::loyalty::PointsError;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

/// Settlement and lifecycle errors
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Menu item not found: {0}")]
    ItemNotFound(i64),

    #[error("Menu item unavailable: {0}")]
    ItemUnavailable(i64),

    #[error("Invalid quantity {quantity} for menu item {menu_item_id}")]
    InvalidQuantity { menu_item_id: i64, quantity: i32 },

    #[error("Invalid unit price {unit_price} for menu item {menu_item_id}")]
    InvalidUnitPrice {
        menu_item_id: i64,
        unit_price: Decimal,
    },

    /// Order number still clashed after the retry
    #[error("Order number conflict: {0}")]
    ConflictOnIdentifier(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Cannot move order from {from:?} to {to:?}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Points(#[from] PointsError),

    #[error("Storage error: {0}")]
    Storage(#[from] RepoError),
}

impl SettlementError {
    /// Cart problems the caller must fix; never retried
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SettlementError::EmptyCart
                | SettlementError::ItemNotFound(_)
                | SettlementError::ItemUnavailable(_)
                | SettlementError::InvalidQuantity { .. }
                | SettlementError::InvalidUnitPrice { .. }
        )
    }
}

impl From<sqlx::Error> for SettlementError {
    fn from(err: sqlx::Error) -> Self {
        SettlementError::Storage(err.into())
    }
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        match err {
            SettlementError::EmptyCart => AppError::new(ErrorCode::OrderEmpty),
            SettlementError::ItemNotFound(id) => {
                AppError::new(ErrorCode::MenuItemNotFound).with_detail("menu_item_id", id)
            }
            SettlementError::ItemUnavailable(id) => {
                AppError::new(ErrorCode::MenuItemUnavailable).with_detail("menu_item_id", id)
            }
            SettlementError::InvalidQuantity {
                menu_item_id,
                quantity,
            } => AppError::new(ErrorCode::InvalidQuantity)
                .with_detail("menu_item_id", menu_item_id)
                .with_detail("quantity", quantity),
            SettlementError::InvalidUnitPrice {
                menu_item_id,
                unit_price,
            } => AppError::new(ErrorCode::InvalidUnitPrice)
                .with_detail("menu_item_id", menu_item_id)
                .with_detail("unit_price", unit_price.to_string()),
            SettlementError::ConflictOnIdentifier(number) => {
                AppError::new(ErrorCode::OrderNumberConflict).with_detail("order_number", number)
            }
            SettlementError::OrderNotFound(key) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("order", key)
            }
            SettlementError::InvalidStatusTransition { from, to } => {
                AppError::new(ErrorCode::InvalidStatusTransition)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            SettlementError::Points(e) => e.into(),
            SettlementError::Storage(e) => e.into(),
        }
    }
}

pub type SettlementResult<T> = Result<T, SettlementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_errors() {
        for err in [
            SettlementError::EmptyCart,
            SettlementError::ItemNotFound(1),
            SettlementError::InvalidQuantity {
                menu_item_id: 1,
                quantity: 0,
            },
        ] {
            assert!(err.is_validation());
            let app: AppError = err.into();
            assert!(app.http_status().is_client_error());
        }
    }

    #[test]
    fn test_conflict_and_points_mapping() {
        let app: AppError = SettlementError::ConflictOnIdentifier("CO202601010001".into()).into();
        assert_eq!(app.http_status().as_u16(), 409);

        let app: AppError = SettlementError::Points(PointsError::InsufficientBalance {
            requested: 200,
            available: 50,
        })
        .into();
        assert_eq!(app.code, ErrorCode::PointsInsufficient);
        assert!(!SettlementError::ConflictOnIdentifier(String::new()).is_validation());
    }
}
