//! Authentication and access control
//!
//! - `jwt`: token issuing, verification middleware, [`CurrentUser`]
//! - `rate_limit`: per-IP limits for login and registration
//! - `access`: company membership, role and extension checks

pub mod access;
pub mod jwt;
pub mod rate_limit;

pub use access::Membership;
pub use jwt::{CurrentUser, JwtService, require_auth};
