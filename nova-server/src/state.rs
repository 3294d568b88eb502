//! Application state for nova-server

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::jwt::JwtService;
use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::error::BoxError;
use crate::storage::ImageStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Token issuing and verification
    pub jwt: Arc<JwtService>,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
    /// Uploaded image storage
    pub images: ImageStore,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl AppState {
    /// Connect to PostgreSQL, run migrations and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let state = Self::with_pool(pool, config);
        state.images.ensure_dir().await?;
        Ok(state)
    }

    /// Build the state around an existing pool (no I/O)
    pub fn with_pool(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            jwt: Arc::new(JwtService::new(&config.jwt_secret, config.jwt_expiry_hours)),
            rate_limiter: RateLimiter::new(),
            images: ImageStore::new(&config.upload_dir),
            max_upload_bytes: config.max_upload_bytes,
            cors_allowed_origins: config.cors_allowed_origins.clone(),
        }
    }
}
