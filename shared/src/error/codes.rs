//! Unified error codes for Lua Nova
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Company errors
//! - 4xxx: Restaurant order errors
//! - 5xxx: Sale errors
//! - 6xxx: Product and stock errors
//! - 7xxx: Table and reservation errors
//! - 8xxx: Extension errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a plain `u16` so the frontend can switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Request body or upload exceeds the size limit
    PayloadTooLarge = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1005,
    /// Email is already registered
    EmailAlreadyRegistered = 1006,
    /// Too many requests from the same client
    TooManyRequests = 1008,

    // ==================== 2xxx: Permission ====================
    /// Company owner role required
    OwnerRequired = 2002,
    /// Company admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Company ====================
    /// Company not found (or caller is not a member)
    CompanyNotFound = 3001,
    /// Company member not found
    MemberNotFound = 3002,
    /// User is already a member of the company
    AlreadyMember = 3003,
    /// The last owner cannot be removed or demoted
    LastOwner = 3004,
    /// User not found
    UserNotFound = 3005,

    // ==================== 4xxx: Restaurant order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order item not found
    OrderItemNotFound = 4002,
    /// Order has no items
    OrderEmpty = 4003,
    /// Order status transition not allowed
    InvalidOrderTransition = 4004,
    /// Order no longer accepts changes
    OrderClosed = 4005,
    /// Order item already left the pending state
    OrderItemLocked = 4006,
    /// Order item status transition not allowed
    InvalidItemTransition = 4007,
    /// Menu item not found
    MenuItemNotFound = 4008,
    /// Menu item is not available
    MenuItemUnavailable = 4009,
    /// Waiter not found
    WaiterNotFound = 4010,
    /// Waiter is inactive
    WaiterInactive = 4011,

    // ==================== 5xxx: Sale ====================
    /// Sale not found
    SaleNotFound = 5001,
    /// Sale has already been cancelled
    SaleAlreadyCancelled = 5002,
    /// Sale has no items
    SaleEmpty = 5003,
    /// Discount is larger than the subtotal
    DiscountExceedsSubtotal = 5004,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Category not found
    CategoryNotFound = 6002,
    /// Unit not found
    UnitNotFound = 6003,
    /// Category name already exists
    CategoryNameExists = 6004,
    /// Category still has products
    CategoryHasProducts = 6005,
    /// Unit is still used by products
    UnitInUse = 6006,
    /// SKU already exists
    SkuExists = 6007,
    /// Category kind does not match product kind
    CategoryKindMismatch = 6008,
    /// Services do not carry stock
    ServiceHasNoStock = 6009,
    /// Not enough stock
    InsufficientStock = 6010,
    /// Product is inactive
    ProductInactive = 6011,
    /// Product/service kind cannot change
    ProductKindImmutable = 6012,
    /// Stock movement not found
    MovementNotFound = 6013,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table number already exists
    TableNumberExists = 7002,
    /// Table status transition not allowed
    InvalidTableTransition = 7003,
    /// Table has an open order
    TableHasOpenOrder = 7004,
    /// Party size exceeds table capacity
    TableCapacityExceeded = 7005,
    /// Reservation not found
    ReservationNotFound = 7006,
    /// Reservation overlaps another reservation
    ReservationConflict = 7007,
    /// Reservation status transition not allowed
    InvalidReservationTransition = 7008,

    // ==================== 8xxx: Extension ====================
    /// Extension not found
    ExtensionNotFound = 8001,
    /// Feature requires an extension the company has not purchased
    ExtensionRequired = 8002,
    /// Extension already active
    ExtensionAlreadyActive = 8003,
    /// Extension not active
    ExtensionNotActive = 8004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// File storage error
    StorageError = 9004,
}

impl ErrorCode {
    /// Every defined code, in declaration order
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::InvalidRequest,
        ErrorCode::ValueOutOfRange,
        ErrorCode::PayloadTooLarge,
        ErrorCode::NotAuthenticated,
        ErrorCode::InvalidCredentials,
        ErrorCode::TokenExpired,
        ErrorCode::TokenInvalid,
        ErrorCode::AccountDisabled,
        ErrorCode::EmailAlreadyRegistered,
        ErrorCode::TooManyRequests,
        ErrorCode::OwnerRequired,
        ErrorCode::AdminRequired,
        ErrorCode::CompanyNotFound,
        ErrorCode::MemberNotFound,
        ErrorCode::AlreadyMember,
        ErrorCode::LastOwner,
        ErrorCode::UserNotFound,
        ErrorCode::OrderNotFound,
        ErrorCode::OrderItemNotFound,
        ErrorCode::OrderEmpty,
        ErrorCode::InvalidOrderTransition,
        ErrorCode::OrderClosed,
        ErrorCode::OrderItemLocked,
        ErrorCode::InvalidItemTransition,
        ErrorCode::MenuItemNotFound,
        ErrorCode::MenuItemUnavailable,
        ErrorCode::WaiterNotFound,
        ErrorCode::WaiterInactive,
        ErrorCode::SaleNotFound,
        ErrorCode::SaleAlreadyCancelled,
        ErrorCode::SaleEmpty,
        ErrorCode::DiscountExceedsSubtotal,
        ErrorCode::ProductNotFound,
        ErrorCode::CategoryNotFound,
        ErrorCode::UnitNotFound,
        ErrorCode::CategoryNameExists,
        ErrorCode::CategoryHasProducts,
        ErrorCode::UnitInUse,
        ErrorCode::SkuExists,
        ErrorCode::CategoryKindMismatch,
        ErrorCode::ServiceHasNoStock,
        ErrorCode::InsufficientStock,
        ErrorCode::ProductInactive,
        ErrorCode::ProductKindImmutable,
        ErrorCode::MovementNotFound,
        ErrorCode::TableNotFound,
        ErrorCode::TableNumberExists,
        ErrorCode::InvalidTableTransition,
        ErrorCode::TableHasOpenOrder,
        ErrorCode::TableCapacityExceeded,
        ErrorCode::ReservationNotFound,
        ErrorCode::ReservationConflict,
        ErrorCode::InvalidReservationTransition,
        ErrorCode::ExtensionNotFound,
        ErrorCode::ExtensionRequired,
        ErrorCode::ExtensionAlreadyActive,
        ErrorCode::ExtensionNotActive,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::StorageError,
    ];

    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::PayloadTooLarge => "Payload is too large",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Permission
            ErrorCode::OwnerRequired => "Company owner role is required",
            ErrorCode::AdminRequired => "Company administrator role is required",

            // Company
            ErrorCode::CompanyNotFound => "Company not found",
            ErrorCode::MemberNotFound => "Company member not found",
            ErrorCode::AlreadyMember => "User is already a member of this company",
            ErrorCode::LastOwner => "A company must keep at least one owner",
            ErrorCode::UserNotFound => "User not found",

            // Restaurant order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderItemNotFound => "Order item not found",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::InvalidOrderTransition => "Order status change is not allowed",
            ErrorCode::OrderClosed => "Order no longer accepts changes",
            ErrorCode::OrderItemLocked => "Order item is already being prepared",
            ErrorCode::InvalidItemTransition => "Order item status change is not allowed",
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemUnavailable => "Menu item is not available",
            ErrorCode::WaiterNotFound => "Waiter not found",
            ErrorCode::WaiterInactive => "Waiter is inactive",

            // Sale
            ErrorCode::SaleNotFound => "Sale not found",
            ErrorCode::SaleAlreadyCancelled => "Sale has already been cancelled",
            ErrorCode::SaleEmpty => "Sale has no items",
            ErrorCode::DiscountExceedsSubtotal => "Discount exceeds the sale subtotal",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::UnitNotFound => "Unit not found",
            ErrorCode::CategoryNameExists => "Category name already exists",
            ErrorCode::CategoryHasProducts => "Category still has products",
            ErrorCode::UnitInUse => "Unit is used by products",
            ErrorCode::SkuExists => "SKU already exists",
            ErrorCode::CategoryKindMismatch => {
                "Category kind does not match the product kind"
            }
            ErrorCode::ServiceHasNoStock => "Services do not carry stock",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::ProductInactive => "Product is inactive",
            ErrorCode::ProductKindImmutable => "A product cannot be turned into a service",
            ErrorCode::MovementNotFound => "Stock movement not found",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableNumberExists => "Table number already exists",
            ErrorCode::InvalidTableTransition => "Table status change is not allowed",
            ErrorCode::TableHasOpenOrder => "Table has an open order",
            ErrorCode::TableCapacityExceeded => "Party size exceeds table capacity",
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::ReservationConflict => "Table is already reserved for that time",
            ErrorCode::InvalidReservationTransition => {
                "Reservation status change is not allowed"
            }

            // Extension
            ErrorCode::ExtensionNotFound => "Extension not found",
            ErrorCode::ExtensionRequired => "This feature requires an extension",
            ErrorCode::ExtensionAlreadyActive => "Extension is already active",
            ErrorCode::ExtensionNotActive => "Extension is not active",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::StorageError => "File storage error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
