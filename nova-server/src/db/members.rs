//! Company membership (company_users)

use shared::error::{AppError, ErrorCode};
use shared::models::{CompanyMember, CompanyRole, ensure_owner_remains};
use sqlx::{PgPool, Postgres, Transaction};

use super::now_millis;
use crate::error::{ServiceError, ServiceResult};

pub async fn find_role(
    pool: &PgPool,
    company_id: i64,
    user_id: i64,
) -> ServiceResult<Option<CompanyRole>> {
    let role: Option<(String,)> =
        sqlx::query_as("SELECT role FROM company_users WHERE company_id = $1 AND user_id = $2")
            .bind(company_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    role.map(|(r,)| r.parse::<CompanyRole>().map_err(|e| ServiceError::Db(e.into())))
        .transpose()
}

pub async fn list(pool: &PgPool, company_id: i64) -> ServiceResult<Vec<CompanyMember>> {
    let rows = sqlx::query_as::<_, CompanyMember>(
        r#"
        SELECT u.id AS user_id, u.name, u.email, cu.role, cu.joined_at
        FROM company_users cu
        JOIN users u ON u.id = cu.user_id
        WHERE cu.company_id = $1
        ORDER BY cu.joined_at
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find(pool: &PgPool, company_id: i64, user_id: i64) -> ServiceResult<Option<CompanyMember>> {
    let row = sqlx::query_as::<_, CompanyMember>(
        r#"
        SELECT u.id AS user_id, u.name, u.email, cu.role, cu.joined_at
        FROM company_users cu
        JOIN users u ON u.id = cu.user_id
        WHERE cu.company_id = $1 AND cu.user_id = $2
        "#,
    )
    .bind(company_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn add(
    pool: &PgPool,
    company_id: i64,
    user_id: i64,
    role: CompanyRole,
) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO company_users (company_id, user_id, role, joined_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(company_id)
    .bind(user_id)
    .bind(role.as_str())
    .bind(now_millis())
    .execute(pool)
    .await
    .map_err(|e| ServiceError::on_unique(e, "company_users_pkey", ErrorCode::AlreadyMember))?;
    Ok(())
}

/// Lock the company's owner rows and return the target's current role
async fn lock_for_change(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    user_id: i64,
) -> ServiceResult<(CompanyRole, i64)> {
    let owners: Vec<(i64,)> = sqlx::query_as(
        "SELECT user_id FROM company_users WHERE company_id = $1 AND role = 'OWNER' FOR UPDATE",
    )
    .bind(company_id)
    .fetch_all(&mut **tx)
    .await?;

    let current: Option<(String,)> = sqlx::query_as(
        "SELECT role FROM company_users WHERE company_id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(company_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;
    let (role,) = current.ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
    let role = role
        .parse::<CompanyRole>()
        .map_err(|e| ServiceError::Db(e.into()))?;
    Ok((role, owners.len() as i64))
}

/// Change a member's role. The last OWNER cannot be demoted.
pub async fn update_role(
    pool: &PgPool,
    company_id: i64,
    user_id: i64,
    role: CompanyRole,
) -> ServiceResult<CompanyRole> {
    let mut tx = pool.begin().await?;
    let (current, owners) = lock_for_change(&mut tx, company_id, user_id).await?;
    ensure_owner_remains(current, Some(role), owners)?;

    sqlx::query("UPDATE company_users SET role = $1 WHERE company_id = $2 AND user_id = $3")
        .bind(role.as_str())
        .bind(company_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(current)
}

/// Remove a member. The last OWNER cannot be removed.
pub async fn remove(pool: &PgPool, company_id: i64, user_id: i64) -> ServiceResult<CompanyRole> {
    let mut tx = pool.begin().await?;
    let (current, owners) = lock_for_change(&mut tx, company_id, user_id).await?;
    ensure_owner_remains(current, None, owners)?;

    sqlx::query("DELETE FROM company_users WHERE company_id = $1 AND user_id = $2")
        .bind(company_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(current)
}

/// Role of the target member, used for permission checks before a change
pub async fn role_of(pool: &PgPool, company_id: i64, user_id: i64) -> ServiceResult<CompanyRole> {
    find_role(pool, company_id, user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound).into())
}
