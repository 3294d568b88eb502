//! Restaurant module models
//!
//! Tables, menu items, waiters, orders (with the kitchen display view) and
//! reservations. Every status enum here owns its transition rules so the
//! server only has to persist the outcome.

pub mod menu_item;
pub mod order;
pub mod reservation;
pub mod table;
pub mod waiter;

pub use menu_item::*;
pub use order::*;
pub use reservation::*;
pub use table::*;
pub use waiter::*;
