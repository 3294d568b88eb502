//! Unified service-layer error type for nova-server
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `BoxError`) and the
//! API-layer error (`AppError`) so data-access code can propagate with `?`.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: database/infrastructure errors (logged, mapped to DatabaseError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl ServiceError {
    /// Map a unique-constraint violation on `constraint` to a business error.
    ///
    /// Any other error is kept as an infrastructure error.
    pub fn on_unique(e: sqlx::Error, constraint: &str, code: ErrorCode) -> Self {
        if unique_violation(&e) == Some(constraint) {
            ServiceError::App(AppError::new(code))
        } else {
            ServiceError::Db(e.into())
        }
    }
}

/// Name of the violated unique constraint, if `e` is a unique violation
pub fn unique_violation(e: &sqlx::Error) -> Option<&str> {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => db.constraint(),
        _ => None,
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_errors_pass_through() {
        let err: AppError = ServiceError::App(AppError::new(ErrorCode::SkuExists)).into();
        assert_eq!(err.code, ErrorCode::SkuExists);
    }

    #[test]
    fn infrastructure_errors_become_database_errors() {
        let err: AppError = ServiceError::from(sqlx::Error::RowNotFound).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.http_status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Database error");
    }

    #[test]
    fn non_unique_errors_are_not_remapped() {
        let err = ServiceError::on_unique(sqlx::Error::PoolTimedOut, "x", ErrorCode::SkuExists);
        assert!(matches!(err, ServiceError::Db(_)));
    }
}
