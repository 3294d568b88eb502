//! Dashboard and report models

use serde::{Deserialize, Serialize};

/// Company dashboard numbers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboard {
    pub product_count: i64,
    pub service_count: i64,
    pub low_stock_count: i64,
    /// Σ stock × cost, in cents
    pub stock_value: i64,
    pub sales_today_count: i64,
    pub sales_today_total: i64,
    pub sales_month_count: i64,
    pub sales_month_total: i64,
}

/// Completed sales of one UTC day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DailySales {
    /// Start of day (Unix ms)
    pub day: i64,
    pub sale_count: i64,
    pub total: i64,
}

/// Best-selling product within a period
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TopProduct {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i64,
    pub total: i64,
}

/// Sales summary report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesSummary {
    pub from: i64,
    pub to: i64,
    pub sale_count: i64,
    pub total: i64,
    pub cancelled_count: i64,
    pub days: Vec<DailySales>,
    pub top_products: Vec<TopProduct>,
}
