//! Product Unit Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Unit of measure ("Kilogram" / "kg", "Unit" / "un")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductUnit {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub abbreviation: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductUnitCreate {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 10, message = "must be 1-10 characters"))]
    pub abbreviation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductUnitUpdate {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 10, message = "must be 1-10 characters"))]
    pub abbreviation: Option<String>,
}
