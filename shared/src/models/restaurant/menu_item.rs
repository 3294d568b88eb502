//! Menu Item Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Price in cents
    pub price: i64,
    /// Free-text menu section ("Drinks", "Mains")
    pub category: Option<String>,
    pub is_available: bool,
    /// Linked physical product; selling the item consumes its stock
    pub product_id: Option<i64>,
    pub preparation_minutes: Option<i32>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MenuItemCreate {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub price: i64,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub category: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    pub product_id: Option<i64>,
    #[validate(range(min = 0, max = 600, message = "must be 0-600"))]
    pub preparation_minutes: Option<i32>,
}

fn default_available() -> bool {
    true
}

/// Update menu item payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MenuItemUpdate {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub price: Option<i64>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub category: Option<String>,
    pub is_available: Option<bool>,
    pub product_id: Option<i64>,
    #[validate(range(min = 0, max = 600, message = "must be 0-600"))]
    pub preparation_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemFilter {
    pub available: Option<bool>,
    pub category: Option<String>,
}
