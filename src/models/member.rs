//! Library member model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::enums::{Gender, MembershipType};
use super::loan::LoanHistoryEntry;
use super::pagination::PageRequest;

pub const DEFAULT_MAX_BOOKS: i32 = 5;

/// Member row as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub member_id: i32,
    pub membership_number: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub membership_type: MembershipType,
    pub membership_start_date: NaiveDate,
    pub membership_expiry_date: NaiveDate,
    pub is_active: bool,
    pub max_books_allowed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Member as shown in listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MemberSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub member: Member,
    pub active_loans: i64,
    /// Unpaid fine amounts
    pub outstanding_fines: Decimal,
}

/// Member with loan counters and recent history
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MemberDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub member: Member,
    pub active_loans: i64,
    pub completed_loans: i64,
    pub outstanding_fines: Decimal,
    /// Ten most recent loans, newest first
    #[sqlx(skip)]
    pub loan_history: Vec<LoanHistoryEntry>,
}

/// Borrowing standing of a member, read under lock by the loan ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct MemberStanding {
    pub member_id: i32,
    pub is_active: bool,
    pub max_books_allowed: i32,
}

/// Create member request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_member"))]
pub struct CreateMember {
    #[validate(length(min = 1, max = 20))]
    pub membership_number: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[validate(email(message = "Invalid email format"), length(max = 100))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub city: Option<String>,
    #[validate(length(max = 10))]
    pub postal_code: Option<String>,
    pub membership_type: Option<MembershipType>,
    pub membership_start_date: NaiveDate,
    pub membership_expiry_date: NaiveDate,
    #[validate(range(min = 1))]
    pub max_books_allowed: Option<i32>,
}

/// Partial member update
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_member"))]
pub struct UpdateMember {
    #[validate(length(min = 1, max = 20))]
    pub membership_number: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[validate(email(message = "Invalid email format"), length(max = 100))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub city: Option<String>,
    #[validate(length(max = 10))]
    pub postal_code: Option<String>,
    pub membership_type: Option<MembershipType>,
    pub membership_start_date: Option<NaiveDate>,
    pub membership_expiry_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    #[validate(range(min = 1))]
    pub max_books_allowed: Option<i32>,
}

impl UpdateMember {
    /// Membership window after applying this patch on top of the stored one
    pub fn merged_dates(&self, current: &Member) -> (NaiveDate, NaiveDate) {
        (
            self.membership_start_date
                .unwrap_or(current.membership_start_date),
            self.membership_expiry_date
                .unwrap_or(current.membership_expiry_date),
        )
    }
}

/// Member listing query parameters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct MemberQuery {
    /// At most `i64::MAX / 100`
    #[validate(range(min = 1, max = 92_233_720_368_547_758i64))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// Case-insensitive match on name, membership number or email
    pub search: Option<String>,
    pub membership_type: Option<MembershipType>,
    pub is_active: Option<bool>,
}

impl MemberQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn check_birth_date(date_of_birth: Option<NaiveDate>) -> Result<(), ValidationError> {
    match date_of_birth {
        Some(dob) if dob > Utc::now().date_naive() => Err(invalid(
            "date_of_birth",
            "Birth date cannot be in the future",
        )),
        _ => Ok(()),
    }
}

pub fn check_membership_window(start: NaiveDate, expiry: NaiveDate) -> Result<(), ValidationError> {
    if expiry <= start {
        return Err(invalid(
            "membership_expiry_date",
            "Expiry date must be after start date",
        ));
    }
    Ok(())
}

fn validate_create_member(member: &CreateMember) -> Result<(), ValidationError> {
    check_birth_date(member.date_of_birth)?;
    check_membership_window(member.membership_start_date, member.membership_expiry_date)
}

fn validate_update_member(member: &UpdateMember) -> Result<(), ValidationError> {
    check_birth_date(member.date_of_birth)?;
    if let (Some(start), Some(expiry)) =
        (member.membership_start_date, member.membership_expiry_date)
    {
        check_membership_window(start, expiry)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_member() -> CreateMember {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        CreateMember {
            membership_number: "TEST2024001".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            date_of_birth: None,
            gender: Some(Gender::Other),
            email: Some("test.user@example.com".to_string()),
            phone_number: Some("+1-555-0199".to_string()),
            address: None,
            city: None,
            postal_code: None,
            membership_type: Some(MembershipType::Regular),
            membership_start_date: start,
            membership_expiry_date: start + Duration::days(365),
            max_books_allowed: Some(5),
        }
    }

    #[test]
    fn test_valid_member_passes() {
        assert!(new_member().validate().is_ok());
    }

    #[test]
    fn test_expiry_must_follow_start() {
        let member = new_member();
        let same_day = CreateMember {
            membership_expiry_date: member.membership_start_date,
            ..member
        };
        assert!(same_day.validate().is_err());
    }

    #[test]
    fn test_future_birth_date_rejected() {
        let member = CreateMember {
            date_of_birth: Some(Utc::now().date_naive() + Duration::days(2)),
            ..new_member()
        };
        assert!(member.validate().is_err());
    }

    #[test]
    fn test_email_and_loan_limit_checked() {
        let bad_email = CreateMember {
            email: Some("not-an-email".to_string()),
            ..new_member()
        };
        assert!(bad_email.validate().is_err());

        let zero_limit = CreateMember {
            max_books_allowed: Some(0),
            ..new_member()
        };
        assert!(zero_limit.validate().is_err());
    }

    #[test]
    fn test_unknown_membership_type_fails_to_parse() {
        let parsed = serde_json::from_str::<UpdateMember>(r#"{"membership_type": "Gold"}"#);
        assert!(parsed.is_err());
    }

    fn stored_member() -> Member {
        let now = Utc::now();
        Member {
            member_id: 1,
            membership_number: "LIB2024001".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            date_of_birth: None,
            gender: None,
            email: None,
            phone_number: None,
            address: None,
            city: None,
            postal_code: None,
            membership_type: MembershipType::Regular,
            membership_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            membership_expiry_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            is_active: true,
            max_books_allowed: DEFAULT_MAX_BOOKS,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_single_date_patch_is_checked_against_stored_window() {
        let current = stored_member();

        // Expiry moved before the stored start
        let patch = UpdateMember {
            membership_expiry_date: NaiveDate::from_ymd_opt(2023, 6, 1),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        let (start, expiry) = patch.merged_dates(&current);
        assert_eq!(start, current.membership_start_date);
        assert!(check_membership_window(start, expiry).is_err());

        // Start moved past the stored expiry
        let patch = UpdateMember {
            membership_start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        let (start, expiry) = patch.merged_dates(&current);
        assert_eq!(expiry, current.membership_expiry_date);
        assert!(check_membership_window(start, expiry).is_err());

        // Renewal keeps the stored start
        let patch = UpdateMember {
            membership_expiry_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            ..Default::default()
        };
        let (start, expiry) = patch.merged_dates(&current);
        assert!(check_membership_window(start, expiry).is_ok());
    }

    #[test]
    fn test_update_only_checks_window_when_both_dates_given() {
        let patch = UpdateMember {
            membership_expiry_date: NaiveDate::from_ymd_opt(2000, 1, 1),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());

        let patch = UpdateMember {
            membership_start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            membership_expiry_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }
}
