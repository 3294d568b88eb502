//! Companies (tenants)

use shared::models::{Company, CompanyCreate, CompanyRole, CompanyUpdate, CompanyWithRole, DEFAULT_CURRENCY};
use sqlx::PgPool;

use super::{now_millis, snowflake_id};
use crate::error::ServiceResult;

const COMPANY_COLUMNS: &str =
    "id, name, tax_id, email, phone, address, currency, logo_url, created_at, updated_at";

/// Create a company and make `owner_id` its OWNER
pub async fn create(pool: &PgPool, owner_id: i64, data: &CompanyCreate) -> ServiceResult<Company> {
    let now = now_millis();
    let currency = data
        .currency
        .as_deref()
        .map(str::to_uppercase)
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let mut tx = pool.begin().await?;
    let company = sqlx::query_as::<_, Company>(&format!(
        "INSERT INTO companies (id, name, tax_id, email, phone, address, currency, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {COMPANY_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&data.tax_id)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(&data.address)
    .bind(&currency)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO company_users (company_id, user_id, role, joined_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(company.id)
    .bind(owner_id)
    .bind(CompanyRole::Owner.as_str())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(company)
}

pub async fn list_for_user(pool: &PgPool, user_id: i64) -> ServiceResult<Vec<CompanyWithRole>> {
    let rows = sqlx::query_as::<_, CompanyWithRole>(
        r#"
        SELECT c.id, c.name, c.tax_id, c.email, c.phone, c.address, c.currency, c.logo_url,
               c.created_at, c.updated_at, cu.role
        FROM companies c
        JOIN company_users cu ON cu.company_id = c.id
        WHERE cu.user_id = $1
        ORDER BY c.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find(pool: &PgPool, id: i64) -> ServiceResult<Option<Company>> {
    let company =
        sqlx::query_as::<_, Company>(&format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(company)
}

pub async fn update(pool: &PgPool, id: i64, data: &CompanyUpdate) -> ServiceResult<Option<Company>> {
    let company = sqlx::query_as::<_, Company>(&format!(
        r#"
        UPDATE companies SET
            name = COALESCE($1, name),
            tax_id = COALESCE($2, tax_id),
            email = COALESCE($3, email),
            phone = COALESCE($4, phone),
            address = COALESCE($5, address),
            currency = COALESCE($6, currency),
            updated_at = $7
        WHERE id = $8
        RETURNING {COMPANY_COLUMNS}
        "#
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.tax_id)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(&data.address)
    .bind(data.currency.as_deref().map(str::to_uppercase))
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(company)
}

pub async fn set_logo(pool: &PgPool, id: i64, logo_url: &str) -> ServiceResult<Option<Company>> {
    let company = sqlx::query_as::<_, Company>(&format!(
        "UPDATE companies SET logo_url = $1, updated_at = $2 WHERE id = $3 RETURNING {COMPANY_COLUMNS}"
    ))
    .bind(logo_url)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(company)
}

/// Delete a company; every company-scoped table cascades
pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    let result = sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
