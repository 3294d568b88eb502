//! Account endpoints
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/auth/register | POST | none (3/min per IP) |
//! | /api/auth/login | POST | none (5/min per IP) |
//! | /api/auth/me | GET, PUT | bearer |
//! | /api/auth/me/password | PUT | bearer |
//! | /api/auth/me/avatar | POST | bearer (multipart) |

use axum::extract::{Multipart, State};
use axum::routing::{get, post, put};
use axum::{Json, Router, middleware};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AuthResponse, CompanyWithRole, LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest,
    User, normalize_email,
};

use super::{ApiResult, upload_body_limit, uploads};
use crate::auth::CurrentUser;
use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::db;
use crate::state::AppState;
use crate::storage::public_url;
use crate::util::{hash_password, verify_password};
use crate::validation::ValidatedJson;

pub fn public_router(state: &AppState) -> Router<AppState> {
    let register = Router::new()
        .route("/api/auth/register", post(register))
        .route_layer(middleware::from_fn_with_state(state.clone(), register_rate_limit));
    let login = Router::new()
        .route("/api/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));
    register.merge(login)
}

pub fn protected_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(me).put(update_profile))
        .route("/api/auth/me/password", put(change_password))
        .route(
            "/api/auth/me/avatar",
            post(upload_avatar).layer(upload_body_limit(state.max_upload_bytes)),
        )
}

fn hash(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        AppError::new(ErrorCode::InternalError)
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let email = normalize_email(&req.email);
    let password_hash = hash(&req.password)?;
    let user = db::users::create(&state.pool, req.name.trim(), &email, &password_hash).await?;
    let token = state.jwt.create_token(user.id, &user.email)?;

    tracing::info!(user_id = user.id, "User registered");
    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email = normalize_email(&req.email);
    let credentials = db::users::credentials_by_email(&state.pool, &email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &credentials.password_hash) {
        tracing::debug!(user_id = credentials.user.id, "Login with wrong password");
        return Err(AppError::invalid_credentials());
    }
    if !credentials.user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let user = credentials.user;
    let token = state.jwt.create_token(user.id, &user.email)?;
    Ok(Json(AuthResponse { token, user }))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub companies: Vec<CompanyWithRole>,
}

async fn load_user(state: &AppState, id: i64) -> Result<User, AppError> {
    db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, current: CurrentUser) -> ApiResult<MeResponse> {
    let user = load_user(&state, current.id).await?;
    let companies = db::companies::list_for_user(&state.pool, user.id).await?;
    Ok(Json(MeResponse { user, companies }))
}

/// PUT /api/auth/me
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(req): ValidatedJson<ProfileUpdate>,
) -> ApiResult<User> {
    let email = req.email.as_deref().map(normalize_email);
    let user = db::users::update_profile(
        &state.pool,
        current.id,
        req.name.as_deref().map(str::trim),
        email.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(user))
}

/// PUT /api/auth/me/password
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(req): ValidatedJson<PasswordChange>,
) -> ApiResult<bool> {
    let credentials = db::users::credentials_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    if !verify_password(&req.current_password, &credentials.password_hash) {
        return Err(AppError::invalid_credentials());
    }

    let password_hash = hash(&req.new_password)?;
    db::users::update_password(&state.pool, current.id, &password_hash).await?;
    tracing::info!(user_id = current.id, "Password changed");
    Ok(Json(true))
}

/// POST /api/auth/me/avatar
pub async fn upload_avatar(
    State(state): State<AppState>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<User> {
    let (filename, data) = uploads::read_file_field(&mut multipart).await?;
    let stored = state
        .images
        .save(&filename, &data, state.max_upload_bytes)
        .await?;
    let user = db::users::set_avatar(&state.pool, current.id, &public_url(&stored))
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(user))
}
