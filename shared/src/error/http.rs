//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::PointsAccountNotFound
            | Self::MenuItemNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::OrderNumberConflict
            | Self::InvalidStatusTransition => StatusCode::CONFLICT,

            // 422 Unprocessable (redemption rejected by ledger rules)
            Self::PointsBelowMinimum | Self::PointsInsufficient => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // 503 Service Unavailable (transient errors, client can retry)
            Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::TierConfigMissing
            | Self::PointsLedgerMismatch => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::ValueOutOfRange
            | Self::OrderEmpty
            | Self::InvalidQuantity
            | Self::InvalidUnitPrice
            | Self::MenuItemUnavailable => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
    }

    #[test]
    fn test_validation_is_client_error() {
        assert_eq!(ErrorCode::OrderEmpty.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::InvalidQuantity.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::MenuItemNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_redemption_rejections() {
        assert_eq!(
            ErrorCode::PointsBelowMinimum.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::PointsInsufficient.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_config_missing_is_server_error() {
        assert!(ErrorCode::TierConfigMissing.http_status().is_server_error());
        assert!(ErrorCode::DatabaseError.http_status().is_server_error());
    }

    #[test]
    fn test_identifier_conflict() {
        assert_eq!(
            ErrorCode::OrderNumberConflict.http_status(),
            StatusCode::CONFLICT
        );
    }
}
