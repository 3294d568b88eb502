//! Product Model
//!
//! A product row is either a physical product (tracked stock) or a service
//! (`is_service = true`, never carries stock). The kind is fixed at creation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, ErrorCode};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub company_id: i64,
    pub category_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub is_service: bool,
    /// Cost price in cents
    pub cost_price: i64,
    /// Sale price in cents
    pub sale_price: i64,
    /// Always 0 for services
    pub stock_quantity: i64,
    pub min_stock: i64,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,

    // -- Joined columns (present on list/detail queries) --
    #[cfg_attr(feature = "db", sqlx(default))]
    pub category_name: Option<String>,
    #[cfg_attr(feature = "db", sqlx(default))]
    pub unit_abbreviation: Option<String>,
}

impl Product {
    /// Reject an update that tries to flip product ↔ service
    pub fn ensure_kind_unchanged(&self, requested: Option<bool>) -> Result<(), AppError> {
        match requested {
            Some(is_service) if is_service != self.is_service => {
                Err(AppError::new(ErrorCode::ProductKindImmutable))
            }
            _ => Ok(()),
        }
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductCreate {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub barcode: Option<String>,
    #[serde(default)]
    pub is_service: bool,
    pub category_id: Option<i64>,
    pub unit_id: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    #[serde(default)]
    pub cost_price: i64,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub sale_price: i64,
    /// Initial stock, recorded as an IN movement
    #[validate(range(min = 0, message = "must not be negative"))]
    pub stock_quantity: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub min_stock: Option<i64>,
    #[validate(length(max = 2048, message = "must be at most 2048 characters"))]
    pub image_url: Option<String>,
}

impl ProductCreate {
    /// Services never carry stock fields
    pub fn check_kind_rules(&self) -> Result<(), AppError> {
        if !self.is_service {
            return Ok(());
        }
        if self.stock_quantity.unwrap_or(0) != 0 {
            return Err(AppError::field(
                "stock_quantity",
                "services do not carry stock",
            ));
        }
        if self.min_stock.unwrap_or(0) != 0 {
            return Err(AppError::field("min_stock", "services do not carry stock"));
        }
        Ok(())
    }

    pub fn initial_stock(&self) -> i64 {
        if self.is_service {
            0
        } else {
            self.stock_quantity.unwrap_or(0)
        }
    }
}

/// Update product payload
///
/// `stock_quantity` is deliberately absent: stock only changes through
/// movements. `is_service` is accepted so clients may echo it back, but it
/// must match the stored kind.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductUpdate {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub barcode: Option<String>,
    pub is_service: Option<bool>,
    pub category_id: Option<i64>,
    pub unit_id: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub cost_price: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub sale_price: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub min_stock: Option<i64>,
    pub is_active: Option<bool>,
    #[validate(length(max = 2048, message = "must be at most 2048 characters"))]
    pub image_url: Option<String>,
}

/// Product list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    pub is_service: Option<bool>,
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub low_stock: Option<bool>,
    pub active: Option<bool>,
}

/// A category may only hold products of its own kind
pub fn ensure_category_kind(product_is_service: bool, category_is_service: bool) -> Result<(), AppError> {
    if product_is_service != category_is_service {
        let expected = if product_is_service { "service" } else { "product" };
        return Err(AppError::with_message(
            ErrorCode::CategoryKindMismatch,
            format!("Category must be a {expected} category"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(is_service: bool, stock: Option<i64>, min: Option<i64>) -> ProductCreate {
        ProductCreate {
            name: "Corte de cabelo".into(),
            description: None,
            sku: None,
            barcode: None,
            is_service,
            category_id: None,
            unit_id: None,
            cost_price: 0,
            sale_price: 3500,
            stock_quantity: stock,
            min_stock: min,
            image_url: None,
        }
    }

    #[test]
    fn service_cannot_carry_initial_stock() {
        let err = create(true, Some(5), None).check_kind_rules().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(create(true, Some(0), None).check_kind_rules().is_ok());
        assert!(create(true, None, Some(2)).check_kind_rules().is_err());
    }

    #[test]
    fn product_keeps_initial_stock() {
        let p = create(false, Some(12), Some(3));
        assert!(p.check_kind_rules().is_ok());
        assert_eq!(p.initial_stock(), 12);
        assert_eq!(create(true, None, None).initial_stock(), 0);
    }

    #[test]
    fn negative_prices_fail_validation() {
        let mut p = create(false, None, None);
        p.sale_price = -1;
        assert!(p.validate().unwrap_err().field_errors().contains_key("sale_price"));
    }

    #[test]
    fn category_kind_must_match() {
        assert!(ensure_category_kind(false, false).is_ok());
        assert!(ensure_category_kind(true, true).is_ok());
        let err = ensure_category_kind(true, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::CategoryKindMismatch);
        assert!(err.message.contains("service"));
    }

    #[test]
    fn kind_is_immutable() {
        let product = Product {
            id: 1,
            company_id: 1,
            category_id: None,
            unit_id: None,
            name: "Farinha".into(),
            description: None,
            sku: None,
            barcode: None,
            is_service: false,
            cost_price: 300,
            sale_price: 550,
            stock_quantity: 2,
            min_stock: 5,
            is_active: true,
            image_url: None,
            created_at: 0,
            updated_at: 0,
            category_name: None,
            unit_abbreviation: None,
        };
        assert!(product.ensure_kind_unchanged(None).is_ok());
        assert!(product.ensure_kind_unchanged(Some(false)).is_ok());
        assert_eq!(
            product.ensure_kind_unchanged(Some(true)).unwrap_err().code,
            ErrorCode::ProductKindImmutable
        );
    }
}
