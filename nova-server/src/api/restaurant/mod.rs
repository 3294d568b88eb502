//! Restaurant module API
//!
//! All routes live under `/api/companies/{id}/restaurant/` and require the
//! `restaurant_system` extension. Catalog-like resources (tables, menu,
//! waiters) are written by ADMIN; floor operations are open to any member.

use axum::Router;

use crate::state::AppState;

mod kitchen;
mod menu;
mod orders;
mod reservations;
mod tables;
mod waiters;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(tables::router())
        .merge(menu::router())
        .merge(waiters::router())
        .merge(orders::router())
        .merge(kitchen::router())
        .merge(reservations::router())
}
