//! Dining Table Model

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, ErrorCode};

string_enum! {
    /// Table occupancy state
    pub enum TableStatus {
        Free => "FREE",
        /// Guests arrived, not yet seated
        Waiting => "WAITING",
        Occupied => "OCCUPIED",
        Reserved => "RESERVED",
        /// Order delivered, bill pending
        Payment => "PAYMENT",
    }
}

impl TableStatus {
    /// Whether `self → next` is an allowed move. Same-status is always allowed.
    pub fn can_transition(&self, next: TableStatus) -> bool {
        use TableStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Free, Waiting | Occupied | Reserved)
                | (Waiting, Occupied | Free)
                | (Reserved, Occupied | Free)
                | (Occupied, Payment | Free)
                | (Payment, Free | Occupied)
        )
    }

    pub fn transition(&self, next: TableStatus) -> Result<TableStatus, AppError> {
        if self.can_transition(next) {
            Ok(next)
        } else {
            Err(AppError::with_message(
                ErrorCode::InvalidTableTransition,
                format!("Cannot change table from {self} to {next}"),
            )
            .with_detail("from", self.as_str())
            .with_detail("to", next.as_str()))
        }
    }
}

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub company_id: i64,
    pub number: i32,
    pub name: Option<String>,
    pub capacity: i32,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: TableStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiningTableCreate {
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub number: i32,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 100, message = "must be 1-100"))]
    pub capacity: i32,
}

/// Update dining table payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiningTableUpdate {
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub number: Option<i32>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 100, message = "must be 1-100"))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatusUpdate {
    pub status: TableStatus,
}

#[cfg(test)]
mod tests {
    use super::TableStatus::*;
    use super::*;

    #[test]
    fn allowed_moves() {
        assert!(Free.can_transition(Waiting));
        assert!(Free.can_transition(Reserved));
        assert!(Waiting.can_transition(Occupied));
        assert!(Reserved.can_transition(Free));
        assert!(Occupied.can_transition(Payment));
        assert!(Payment.can_transition(Occupied));
        assert!(Payment.can_transition(Free));
    }

    #[test]
    fn rejected_moves() {
        assert!(!Free.can_transition(Payment));
        assert!(!Waiting.can_transition(Reserved));
        assert!(!Reserved.can_transition(Payment));
        assert!(!Occupied.can_transition(Reserved));

        let err = Free.transition(Payment).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTableTransition);
        assert_eq!(err.details.unwrap()["to"], "PAYMENT");
    }

    #[test]
    fn same_status_is_noop() {
        for status in TableStatus::ALL {
            assert_eq!(status.transition(*status).unwrap(), *status);
        }
    }
}
