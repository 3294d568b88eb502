//! Shared types for Lua Nova
//!
//! Domain models, status machines, the unified error system and small
//! utilities used by the server and its tests. This crate performs no I/O.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
