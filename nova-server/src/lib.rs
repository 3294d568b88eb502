//! nova-server: Lua Nova inventory and point-of-sale backend
//!
//! Multi-tenant REST API over PostgreSQL: companies and members, product and
//! service catalog, stock ledger, sales, purchasable extensions (restaurant,
//! services, advanced reports) and per-company backups.

pub mod api;
pub mod auth;
pub mod backup;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
pub mod storage;
pub mod util;
pub mod validation;

pub use api::router;
pub use config::Config;
pub use state::AppState;
