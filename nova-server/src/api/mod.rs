//! HTTP API
//!
//! | Prefix | Auth |
//! |--------|------|
//! | `/health` | none |
//! | `/api/auth/register`, `/api/auth/login` | none, rate limited |
//! | `/api/uploads/{filename}` | none |
//! | everything else under `/api` | bearer token |
//!
//! Company-scoped handlers resolve a membership through
//! [`crate::auth::access`] before touching data.

pub mod audit;
pub mod auth;
pub mod backup;
pub mod categories;
pub mod companies;
pub mod extensions;
pub mod health;
pub mod members;
pub mod movements;
pub mod products;
pub mod reports;
pub mod restaurant;
pub mod sales;
pub mod units;
pub mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::{Json, Router, middleware};
use http::{HeaderName, HeaderValue, Method};
use shared::error::AppError;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// JSON bodies; uploads get their own limit
const JSON_BODY_LIMIT: usize = 1024 * 1024;

const REQUEST_ID: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Routes that require a bearer token
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::protected_router(state))
        .merge(companies::router(state))
        .merge(members::router())
        .merge(categories::router())
        .merge(units::router())
        .merge(products::router())
        .merge(movements::router())
        .merge(sales::router())
        .merge(extensions::router())
        .merge(reports::router())
        .merge(audit::router())
        .merge(backup::router())
        .merge(restaurant::router())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect::<Vec<_>>(),
        )
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(REQUEST_ID)])
}

/// Build the application router with middleware and state
pub fn router(state: AppState) -> Router {
    let protected = protected_routes(&state).route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_auth,
    ));

    Router::new()
        .merge(health::router())
        .merge(auth::public_router(&state))
        .merge(uploads::router())
        .merge(protected)
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(cors_layer(&state.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID)))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID),
            XRequestId,
        ))
        .with_state(state)
}

/// Body limit for multipart upload routes
pub(crate) fn upload_body_limit(max_upload_bytes: usize) -> DefaultBodyLimit {
    // Multipart framing adds a few KiB around the file
    DefaultBodyLimit::max(max_upload_bytes + 64 * 1024)
}
