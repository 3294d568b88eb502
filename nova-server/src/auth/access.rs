//! Company access control
//!
//! Every `/api/companies/{id}/...` handler resolves a [`Membership`] first.
//! Non-members get 404 so company IDs cannot be enumerated.

use shared::error::{AppError, ErrorCode};
use shared::models::CompanyRole;
use shared::models::extension::EXT_RESTAURANT;

use super::CurrentUser;
use crate::db;
use crate::state::AppState;

/// The caller's role inside one company
#[derive(Debug, Clone, Copy)]
pub struct Membership {
    pub company_id: i64,
    pub user_id: i64,
    pub role: CompanyRole,
}

impl Membership {
    /// Fail unless the caller holds at least `required`
    pub fn require(&self, required: CompanyRole) -> Result<(), AppError> {
        if self.role.at_least(required) {
            return Ok(());
        }
        let code = match required {
            CompanyRole::Owner => ErrorCode::OwnerRequired,
            _ => ErrorCode::AdminRequired,
        };
        Err(AppError::new(code).with_detail("role", self.role.as_str()))
    }
}

/// Resolve the caller's membership in `company_id`
pub async fn member(
    state: &AppState,
    user: &CurrentUser,
    company_id: i64,
) -> Result<Membership, AppError> {
    let role = db::members::find_role(&state.pool, company_id, user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;
    Ok(Membership {
        company_id,
        user_id: user.id,
        role,
    })
}

/// Membership with at least the ADMIN role
pub async fn admin(
    state: &AppState,
    user: &CurrentUser,
    company_id: i64,
) -> Result<Membership, AppError> {
    let m = member(state, user, company_id).await?;
    m.require(CompanyRole::Admin)?;
    Ok(m)
}

/// Fail with `ExtensionRequired` unless `key` is active for the company
pub async fn require_extension(
    state: &AppState,
    company_id: i64,
    key: &str,
) -> Result<(), AppError> {
    if db::extensions::is_active(&state.pool, company_id, key).await? {
        Ok(())
    } else {
        Err(AppError::extension_required(key))
    }
}

/// Membership for restaurant routes (requires `restaurant_system`)
pub async fn restaurant(
    state: &AppState,
    user: &CurrentUser,
    company_id: i64,
) -> Result<Membership, AppError> {
    let m = member(state, user, company_id).await?;
    require_extension(state, company_id, EXT_RESTAURANT).await?;
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(role: CompanyRole) -> Membership {
        Membership {
            company_id: 1,
            user_id: 2,
            role,
        }
    }

    #[test]
    fn role_hierarchy() {
        assert!(membership(CompanyRole::Owner).require(CompanyRole::Admin).is_ok());
        assert!(membership(CompanyRole::Admin).require(CompanyRole::Employee).is_ok());
        assert_eq!(
            membership(CompanyRole::Admin)
                .require(CompanyRole::Owner)
                .unwrap_err()
                .code,
            ErrorCode::OwnerRequired
        );
        assert_eq!(
            membership(CompanyRole::Employee)
                .require(CompanyRole::Admin)
                .unwrap_err()
                .code,
            ErrorCode::AdminRequired
        );
    }
}
