//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::NotFound
            | Self::CompanyNotFound
            | Self::MemberNotFound
            | Self::UserNotFound
            | Self::OrderNotFound
            | Self::OrderItemNotFound
            | Self::MenuItemNotFound
            | Self::WaiterNotFound
            | Self::SaleNotFound
            | Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::UnitNotFound
            | Self::MovementNotFound
            | Self::TableNotFound
            | Self::ReservationNotFound
            | Self::ExtensionNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::EmailAlreadyRegistered
            | Self::AlreadyMember
            | Self::SaleAlreadyCancelled
            | Self::CategoryNameExists
            | Self::CategoryHasProducts
            | Self::UnitInUse
            | Self::SkuExists
            | Self::TableNumberExists
            | Self::TableHasOpenOrder
            | Self::ReservationConflict
            | Self::ExtensionAlreadyActive => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::OwnerRequired
            | Self::AdminRequired
            | Self::ExtensionRequired => StatusCode::FORBIDDEN,

            // 413 Payload Too Large
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            // 429 Too Many Requests
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 422 Unprocessable Entity (business rules)
            Self::LastOwner
            | Self::OrderEmpty
            | Self::InvalidOrderTransition
            | Self::OrderClosed
            | Self::OrderItemLocked
            | Self::InvalidItemTransition
            | Self::MenuItemUnavailable
            | Self::WaiterInactive
            | Self::DiscountExceedsSubtotal
            | Self::CategoryKindMismatch
            | Self::ServiceHasNoStock
            | Self::InsufficientStock
            | Self::ProductInactive
            | Self::ProductKindImmutable
            | Self::InvalidTableTransition
            | Self::TableCapacityExceeded
            | Self::InvalidReservationTransition
            | Self::ExtensionNotActive => StatusCode::UNPROCESSABLE_ENTITY,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::StorageError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::CompanyNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::ProductNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_validation_is_bad_request() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::InvalidRequest.http_status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_is_unauthorized() {
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::TokenExpired.http_status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_business_rules_are_unprocessable() {
        assert_eq!(
            ErrorCode::InsufficientStock.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::InvalidOrderTransition.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_extension_required_is_forbidden() {
        assert_eq!(
            ErrorCode::ExtensionRequired.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_system_errors_are_internal() {
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_no_code_maps_to_ok() {
        for code in ErrorCode::ALL {
            assert!(
                code.http_status().is_client_error() || code.http_status().is_server_error(),
                "{code} maps to {}",
                code.http_status()
            );
        }
    }
}
