//! User accounts

use shared::error::ErrorCode;
use shared::models::User;
use sqlx::PgPool;

use super::{now_millis, snowflake_id};
use crate::error::{ServiceError, ServiceResult};

const USER_COLUMNS: &str = "id, name, email, avatar_url, is_active, created_at, updated_at";

/// User row including the password hash (never serialized)
#[derive(sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> ServiceResult<User> {
    let now = now_millis();
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (id, name, email, password_hash, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, TRUE, $5, $5) RETURNING {USER_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| ServiceError::on_unique(e, "users_email_key", ErrorCode::EmailAlreadyRegistered))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> ServiceResult<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

pub async fn credentials_by_email(
    pool: &PgPool,
    email: &str,
) -> ServiceResult<Option<UserCredentials>> {
    let row = sqlx::query_as::<_, UserCredentials>(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn credentials_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<UserCredentials>> {
    let row = sqlx::query_as::<_, UserCredentials>(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    email: Option<&str>,
) -> ServiceResult<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET name = COALESCE($1, name), email = COALESCE($2, email), updated_at = $3 \
         WHERE id = $4 RETURNING {USER_COLUMNS}"
    ))
    .bind(name)
    .bind(email)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ServiceError::on_unique(e, "users_email_key", ErrorCode::EmailAlreadyRegistered))
}

pub async fn update_password(pool: &PgPool, id: i64, password_hash: &str) -> ServiceResult<()> {
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
        .bind(password_hash)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_avatar(pool: &PgPool, id: i64, avatar_url: &str) -> ServiceResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET avatar_url = $1, updated_at = $2 WHERE id = $3 RETURNING {USER_COLUMNS}"
    ))
    .bind(avatar_url)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}
