//! Database access layer (PostgreSQL)
//!
//! Free functions taking `&PgPool` (or a transaction) and returning
//! [`ServiceResult`](crate::error::ServiceResult). Every company-scoped query
//! filters on `company_id`.

pub mod audit;
pub mod backup;
pub mod categories;
pub mod companies;
pub mod extensions;
pub mod members;
pub mod movements;
pub mod products;
pub mod reports;
pub mod restaurant;
pub mod sales;
pub mod units;
pub mod users;

pub use shared::util::{now_millis, snowflake_id};
