//! Sale Model

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, ErrorCode};

string_enum! {
    pub enum PaymentMethod {
        Cash => "CASH",
        Card => "CARD",
        Transfer => "TRANSFER",
        Pix => "PIX",
        Other => "OTHER",
    }
}

string_enum! {
    pub enum SaleStatus {
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

/// Sale header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub company_id: i64,
    pub user_id: Option<i64>,
    /// Restaurant order that produced this sale, if any
    pub order_id: Option<i64>,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: SaleStatus,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    /// Amounts in cents
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    pub cancelled_at: Option<i64>,
    pub cancel_reason: Option<String>,
    pub created_at: i64,
}

/// Sale line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    /// `None` for restaurant lines without a linked product
    pub product_id: Option<i64>,
    pub product_name: String,
    pub is_service: bool,
    pub quantity: i64,
    pub unit_price: i64,
    pub total: i64,
}

/// Sale with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// One requested sale line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaleItemInput {
    pub product_id: i64,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: i64,
    /// Overrides the product sale price (cents)
    #[validate(range(min = 0, message = "must not be negative"))]
    pub unit_price: Option<i64>,
}

/// Create sale payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaleCreate {
    #[validate(nested)]
    pub items: Vec<SaleItemInput>,
    #[validate(range(min = 0, message = "must not be negative"))]
    #[serde(default)]
    pub discount: i64,
    pub payment_method: PaymentMethod,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub customer_name: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Cancel sale payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SaleCancel {
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Sale list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleFilter {
    pub status: Option<SaleStatus>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// Computed money totals of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
}

/// Sum `(quantity, unit_price)` lines and apply the discount
pub fn compute_totals(lines: &[(i64, i64)], discount: i64) -> Result<SaleTotals, AppError> {
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::SaleEmpty));
    }
    let subtotal = lines
        .iter()
        .try_fold(0i64, |acc, (qty, price)| {
            qty.checked_mul(*price).and_then(|line| acc.checked_add(line))
        })
        .ok_or_else(|| AppError::new(ErrorCode::ValueOutOfRange))?;
    if discount < 0 {
        return Err(AppError::field("discount", "must not be negative"));
    }
    if discount > subtotal {
        return Err(AppError::new(ErrorCode::DiscountExceedsSubtotal)
            .with_detail("subtotal", subtotal)
            .with_detail("discount", discount));
    }
    Ok(SaleTotals {
        subtotal,
        discount,
        total: subtotal - discount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_sum_lines_and_apply_discount() {
        let t = compute_totals(&[(2, 550), (1, 1200)], 300).unwrap();
        assert_eq!(
            t,
            SaleTotals {
                subtotal: 2300,
                discount: 300,
                total: 2000
            }
        );
    }

    #[test]
    fn discount_cannot_exceed_subtotal() {
        let err = compute_totals(&[(1, 100)], 101).unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountExceedsSubtotal);
        assert!(compute_totals(&[(1, 100)], 100).is_ok());
    }

    #[test]
    fn empty_sale_rejected() {
        assert_eq!(compute_totals(&[], 0).unwrap_err().code, ErrorCode::SaleEmpty);
    }

    #[test]
    fn overflow_is_reported() {
        let err = compute_totals(&[(i64::MAX, 2)], 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn sale_create_validates_nested_items() {
        let req = SaleCreate {
            items: vec![SaleItemInput {
                product_id: 1,
                quantity: 0,
                unit_price: None,
            }],
            discount: 0,
            payment_method: PaymentMethod::Pix,
            customer_name: None,
            notes: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }

    #[test]
    fn payment_method_wire_format() {
        let m: PaymentMethod = serde_json::from_str("\"PIX\"").unwrap();
        assert_eq!(m, PaymentMethod::Pix);
        assert!(serde_json::from_str::<PaymentMethod>("\"BITCOIN\"").is_err());
    }
}
