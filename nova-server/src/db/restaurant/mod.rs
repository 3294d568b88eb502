//! Restaurant module storage
//!
//! Only reachable through routes gated on the `restaurant_system` extension.

pub mod menu;
pub mod orders;
pub mod reservations;
pub mod tables;
pub mod waiters;
