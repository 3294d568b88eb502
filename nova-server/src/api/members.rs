//! Company membership endpoints
//!
//! Roles: OWNER > ADMIN > EMPLOYEE. Only an OWNER may grant or revoke
//! OWNER, and the last OWNER can never be demoted or removed.

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{CompanyMember, CompanyRole, MemberAdd, MemberUpdate, normalize_email};

use super::ApiResult;
use crate::auth::{CurrentUser, Membership, access};
use crate::db;
use crate::state::AppState;
use crate::validation::{AppJson, AppPath, ValidatedJson};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/users", get(list).post(add))
        .route(
            "/api/companies/{id}/users/{user_id}",
            put(update_role).delete(remove),
        )
}

/// Granting, changing or revoking OWNER needs an OWNER
fn check_owner_grant(
    actor: &Membership,
    current: Option<CompanyRole>,
    requested: Option<CompanyRole>,
) -> Result<(), AppError> {
    let touches_owner =
        current == Some(CompanyRole::Owner) || requested == Some(CompanyRole::Owner);
    if touches_owner {
        actor.require(CompanyRole::Owner)?;
    }
    Ok(())
}

/// GET /api/companies/{id}/users
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Vec<CompanyMember>> {
    access::member(&state, &user, id).await?;
    let members = db::members::list(&state.pool, id).await?;
    Ok(Json(members))
}

/// POST /api/companies/{id}/users {email, role}
pub async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<MemberAdd>,
) -> ApiResult<CompanyMember> {
    let actor = access::admin(&state, &user, id).await?;
    check_owner_grant(&actor, None, Some(req.role))?;

    let target = db::users::find_by_email(&state.pool, &normalize_email(&req.email))
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    db::members::add(&state.pool, id, target.id, req.role).await?;

    db::audit::record(
        &state.pool,
        id,
        user.id,
        db::audit::MEMBER_ADDED,
        json!({ "user_id": target.id, "role": req.role }),
    )
    .await;

    let member = db::members::find(&state.pool, id, target.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
    Ok(Json(member))
}

/// PUT /api/companies/{id}/users/{user_id} {role}
pub async fn update_role(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, user_id)): AppPath<(i64, i64)>,
    AppJson(req): AppJson<MemberUpdate>,
) -> ApiResult<CompanyMember> {
    let actor = access::admin(&state, &user, id).await?;
    let current = db::members::role_of(&state.pool, id, user_id).await?;
    check_owner_grant(&actor, Some(current), Some(req.role))?;

    let previous = db::members::update_role(&state.pool, id, user_id, req.role).await?;
    if previous != req.role {
        db::audit::record(
            &state.pool,
            id,
            user.id,
            db::audit::MEMBER_ROLE_CHANGED,
            json!({ "user_id": user_id, "from": previous, "to": req.role }),
        )
        .await;
    }

    let member = db::members::find(&state.pool, id, user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
    Ok(Json(member))
}

/// DELETE /api/companies/{id}/users/{user_id}
///
/// Members may always leave on their own, subject to the last-owner rule.
pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, user_id)): AppPath<(i64, i64)>,
) -> ApiResult<bool> {
    let actor = access::member(&state, &user, id).await?;
    if user_id != user.id {
        actor.require(CompanyRole::Admin)?;
        let current = db::members::role_of(&state.pool, id, user_id).await?;
        check_owner_grant(&actor, Some(current), None)?;
    }

    let previous = db::members::remove(&state.pool, id, user_id).await?;
    db::audit::record(
        &state.pool,
        id,
        user.id,
        db::audit::MEMBER_REMOVED,
        json!({ "user_id": user_id, "role": previous }),
    )
    .await;
    Ok(Json(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: CompanyRole) -> Membership {
        Membership {
            company_id: 1,
            user_id: 1,
            role,
        }
    }

    #[test]
    fn admin_cannot_grant_owner() {
        let err = check_owner_grant(&actor(CompanyRole::Admin), None, Some(CompanyRole::Owner))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OwnerRequired);
    }

    #[test]
    fn admin_cannot_demote_owner() {
        let result = check_owner_grant(
            &actor(CompanyRole::Admin),
            Some(CompanyRole::Owner),
            Some(CompanyRole::Employee),
        );
        assert!(result.is_err());
    }

    #[test]
    fn admin_manages_non_owner_roles() {
        assert!(
            check_owner_grant(
                &actor(CompanyRole::Admin),
                Some(CompanyRole::Employee),
                Some(CompanyRole::Admin)
            )
            .is_ok()
        );
        assert!(
            check_owner_grant(&actor(CompanyRole::Owner), None, Some(CompanyRole::Owner)).is_ok()
        );
    }
}
