//! Stock Movement Model
//!
//! Movements are the only way stock changes. Each row records the quantity
//! before and after so the ledger can be audited without replaying it.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, ErrorCode};

string_enum! {
    /// Kind of stock movement
    pub enum MovementType {
        /// Goods received
        In => "IN",
        /// Goods removed (loss, internal use)
        Out => "OUT",
        /// Goods sold
        Sale => "SALE",
        /// Goods returned by a customer
        Return => "RETURN",
        /// Money returned to a customer; no stock effect
        Refund => "REFUND",
        /// Physical count: stock is set to the given quantity
        Adjustment => "ADJUSTMENT",
    }
}

impl MovementType {
    /// Whether this movement type changes stock at all
    pub const fn affects_stock(&self) -> bool {
        !matches!(self, MovementType::Refund)
    }

    /// Compute the stock level after applying this movement.
    ///
    /// `quantity` must be positive, except for `ADJUSTMENT` where it is the
    /// counted stock and may be zero. The result is never negative.
    pub fn apply(&self, current: i64, quantity: i64) -> Result<i64, AppError> {
        let min_qty = if matches!(self, MovementType::Adjustment) { 0 } else { 1 };
        if quantity < min_qty {
            return Err(AppError::field(
                "quantity",
                if min_qty == 0 {
                    "must not be negative"
                } else {
                    "must be greater than zero"
                },
            ));
        }

        let next = match self {
            MovementType::In | MovementType::Return => current.checked_add(quantity),
            MovementType::Out | MovementType::Sale => current.checked_sub(quantity),
            MovementType::Refund => Some(current),
            MovementType::Adjustment => Some(quantity),
        }
        .ok_or_else(|| AppError::new(ErrorCode::ValueOutOfRange))?;

        if next < 0 {
            return Err(AppError::with_message(
                ErrorCode::InsufficientStock,
                format!("Insufficient stock: {current} available, {quantity} requested"),
            )
            .with_detail("available", current)
            .with_detail("requested", quantity));
        }
        Ok(next)
    }
}

/// Stock movement entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: i64,
    pub company_id: i64,
    pub product_id: i64,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub movement_type: MovementType,
    pub quantity: i64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    /// Unit cost in cents (IN movements)
    pub unit_cost: Option<i64>,
    pub reason: Option<String>,
    pub sale_id: Option<i64>,
    pub user_id: Option<i64>,
    pub created_at: i64,

    #[cfg_attr(feature = "db", sqlx(default))]
    pub product_name: Option<String>,
}

/// Create movement payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MovementCreate {
    pub product_id: i64,
    pub movement_type: MovementType,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub quantity: i64,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub reason: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub unit_cost: Option<i64>,
}

/// Movement list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<i64>,
    pub movement_type: Option<MovementType>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_movements_add_stock() {
        assert_eq!(MovementType::In.apply(3, 7).unwrap(), 10);
        assert_eq!(MovementType::Return.apply(0, 2).unwrap(), 2);
    }

    #[test]
    fn outbound_movements_subtract_stock() {
        assert_eq!(MovementType::Out.apply(10, 4).unwrap(), 6);
        assert_eq!(MovementType::Sale.apply(5, 5).unwrap(), 0);
    }

    #[test]
    fn stock_never_goes_negative() {
        let err = MovementType::Sale.apply(2, 3).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        let details = err.details.unwrap();
        assert_eq!(details["available"], 2);
        assert_eq!(details["requested"], 3);
    }

    #[test]
    fn refund_leaves_stock_untouched() {
        assert!(!MovementType::Refund.affects_stock());
        assert_eq!(MovementType::Refund.apply(9, 4).unwrap(), 9);
    }

    #[test]
    fn adjustment_sets_counted_stock() {
        assert_eq!(MovementType::Adjustment.apply(9, 4).unwrap(), 4);
        assert_eq!(MovementType::Adjustment.apply(9, 0).unwrap(), 0);
        assert!(MovementType::Adjustment.apply(9, -1).is_err());
    }

    #[test]
    fn zero_quantity_rejected_for_regular_movements() {
        let err = MovementType::In.apply(1, 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn movement_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&MovementType::Adjustment).unwrap(),
            "\"ADJUSTMENT\""
        );
        assert_eq!("RETURN".parse::<MovementType>().unwrap(), MovementType::Return);
    }
}
