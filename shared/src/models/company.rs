//! Company Model (tenant) and membership roles

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, ErrorCode};

string_enum! {
    /// Role of a user inside a company
    pub enum CompanyRole {
        Owner => "OWNER",
        Admin => "ADMIN",
        Employee => "EMPLOYEE",
    }
}

impl CompanyRole {
    /// Higher rank includes every permission of the lower ranks
    pub const fn rank(&self) -> u8 {
        match self {
            CompanyRole::Owner => 3,
            CompanyRole::Admin => 2,
            CompanyRole::Employee => 1,
        }
    }

    /// Whether this role satisfies `required`
    pub fn at_least(&self, required: CompanyRole) -> bool {
        self.rank() >= required.rank()
    }
}

/// Company entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub currency: String,
    pub logo_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Company as seen by one of its members
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CompanyWithRole {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub company: Company,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub role: CompanyRole,
}

/// Create company payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompanyCreate {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 32, message = "must be at most 32 characters"))]
    pub tax_id: Option<String>,
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    #[validate(length(max = 32, message = "must be at most 32 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub address: Option<String>,
    #[validate(length(equal = 3, message = "must be a 3-letter ISO code"))]
    pub currency: Option<String>,
}

/// Update company payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompanyUpdate {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 32, message = "must be at most 32 characters"))]
    pub tax_id: Option<String>,
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    #[validate(length(max = 32, message = "must be at most 32 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub address: Option<String>,
    #[validate(length(equal = 3, message = "must be a 3-letter ISO code"))]
    pub currency: Option<String>,
}

/// Company member (user + role)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CompanyMember {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub role: CompanyRole,
    pub joined_at: i64,
}

/// Add member payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MemberAdd {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    pub role: CompanyRole,
}

/// Change member role payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub role: CompanyRole,
}

/// Default currency when none is supplied
pub const DEFAULT_CURRENCY: &str = "BRL";

/// Reject removing or demoting the last OWNER.
///
/// `new_role` is `None` when the member is being removed.
pub fn ensure_owner_remains(
    current: CompanyRole,
    new_role: Option<CompanyRole>,
    owner_count: i64,
) -> Result<(), AppError> {
    let loses_owner = current == CompanyRole::Owner && new_role != Some(CompanyRole::Owner);
    if loses_owner && owner_count <= 1 {
        return Err(AppError::new(ErrorCode::LastOwner));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ranking() {
        assert!(CompanyRole::Owner.at_least(CompanyRole::Admin));
        assert!(CompanyRole::Admin.at_least(CompanyRole::Admin));
        assert!(CompanyRole::Admin.at_least(CompanyRole::Employee));
        assert!(!CompanyRole::Employee.at_least(CompanyRole::Admin));
        assert!(!CompanyRole::Admin.at_least(CompanyRole::Owner));
    }

    #[test]
    fn role_parses_from_stored_text() {
        assert_eq!("OWNER".parse::<CompanyRole>().unwrap(), CompanyRole::Owner);
        assert_eq!(
            CompanyRole::try_from("EMPLOYEE".to_string()).unwrap(),
            CompanyRole::Employee
        );
        let err = "owner".parse::<CompanyRole>().unwrap_err();
        assert_eq!(err.kind, "CompanyRole");
    }

    #[test]
    fn last_owner_is_protected() {
        use CompanyRole::*;
        assert_eq!(
            ensure_owner_remains(Owner, None, 1).unwrap_err().code,
            ErrorCode::LastOwner
        );
        assert!(ensure_owner_remains(Owner, Some(Admin), 1).is_err());
        assert!(ensure_owner_remains(Owner, Some(Owner), 1).is_ok());
        assert!(ensure_owner_remains(Owner, None, 2).is_ok());
        assert!(ensure_owner_remains(Admin, None, 1).is_ok());
    }

    #[test]
    fn role_serializes_screaming_case() {
        let json = serde_json::to_string(&CompanyRole::Admin).unwrap();
        assert_eq!(json, "\"ADMIN\"");
    }

    #[test]
    fn company_create_validates_currency() {
        let req = CompanyCreate {
            name: "Lua Nova Café".into(),
            tax_id: None,
            email: None,
            phone: None,
            address: None,
            currency: Some("REAL".into()),
        };
        assert!(req.validate().unwrap_err().field_errors().contains_key("currency"));
    }
}
