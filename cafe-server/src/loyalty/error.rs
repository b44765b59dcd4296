use crate::db::repository::RepoError;
use shared::error::{AppError, ErrorCode};
use shared::models::{MembershipTier, TransactionKind};
use thiserror::Error;

/// Loyalty errors
#[derive(Debug, Error)]
pub enum PointsError {
    #[error("Redemption requires at least {minimum} points, got {requested}")]
    BelowMinimumRedemption { requested: i64, minimum: i64 },

    #[error("Insufficient points: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("Points account not found: {0}")]
    AccountNotFound(i64),

    /// No active tier configuration row; blocks all point math
    #[error("No active tier configuration for {0}")]
    ConfigMissing(MembershipTier),

    #[error("Point amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("{0:?} entries cannot credit an account")]
    InvalidKind(TransactionKind),

    #[error("Ledger mismatch for {customer_id}: stored {stored}, replayed {replayed}")]
    LedgerMismatch {
        customer_id: i64,
        stored: i64,
        replayed: i64,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] RepoError),
}

impl From<PointsError> for AppError {
    fn from(err: PointsError) -> Self {
        match err {
            PointsError::BelowMinimumRedemption { requested, minimum } => AppError::with_message(
                ErrorCode::PointsBelowMinimum,
                format!("Redemption requires at least {minimum} points"),
            )
            .with_detail("requested", requested)
            .with_detail("minimum", minimum),
            PointsError::InsufficientBalance {
                requested,
                available,
            } => AppError::new(ErrorCode::PointsInsufficient)
                .with_detail("requested", requested)
                .with_detail("available", available),
            PointsError::AccountNotFound(customer_id) => {
                AppError::new(ErrorCode::PointsAccountNotFound).with_detail("customer_id", customer_id)
            }
            PointsError::ConfigMissing(tier) => {
                tracing::error!(tier = %tier, "Tier configuration missing");
                AppError::new(ErrorCode::TierConfigMissing).with_detail("tier", tier.as_str())
            }
            PointsError::InvalidAmount(points) => {
                AppError::new(ErrorCode::ValueOutOfRange).with_detail("points", points)
            }
            e @ PointsError::InvalidKind(_) => AppError::with_message(ErrorCode::InvalidRequest, e.to_string()),
            e @ PointsError::LedgerMismatch { .. } => {
                tracing::error!(error = %e, "Points ledger mismatch");
                AppError::with_message(ErrorCode::PointsLedgerMismatch, e.to_string())
            }
            PointsError::Storage(e) => e.into(),
        }
    }
}

pub type PointsResult<T> = Result<T, PointsError>;
