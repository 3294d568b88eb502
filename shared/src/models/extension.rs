//! Extension Model
//!
//! Extensions are purchasable per-company feature flags that gate parts of
//! the API (and the matching UI).

use serde::{Deserialize, Serialize};

/// Restaurant module: tables, orders, kitchen display, waiters, reservations
pub const EXT_RESTAURANT: &str = "restaurant_system";
/// Service catalog: products with `is_service = true`
pub const EXT_SERVICES: &str = "services_management";
/// Sales summary reports
pub const EXT_ADVANCED_REPORTS: &str = "advanced_reports";

/// Catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Extension {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    /// Price in cents
    pub price: i64,
    pub is_available: bool,
}

/// Catalog entry with the company's activation state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CompanyExtension {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub extension: Extension,
    pub active: bool,
    pub activated_at: Option<i64>,
}

/// Keys of active extensions for one company
#[derive(Debug, Clone, Default)]
pub struct ActiveExtensions(Vec<String>);

impl ActiveExtensions {
    pub fn new(keys: Vec<String>) -> Self {
        Self(keys)
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_extensions_lookup() {
        let active = ActiveExtensions::new(vec![EXT_RESTAURANT.to_string()]);
        assert!(active.has(EXT_RESTAURANT));
        assert!(!active.has(EXT_SERVICES));
        assert_eq!(active.keys().len(), 1);
    }
}
