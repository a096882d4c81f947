//! Loan transaction model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::enums::{DisplayStatus, LoanStatus};
use super::pagination::PageRequest;

/// Loan transaction row as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanTransaction {
    pub transaction_id: i32,
    pub member_id: i32,
    pub book_id: i32,
    pub staff_id: Option<i32>,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub loan_status: LoanStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create loan (borrow) request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_loan"))]
pub struct CreateLoan {
    #[validate(range(min = 1))]
    pub member_id: i32,
    #[validate(range(min = 1))]
    pub book_id: i32,
    pub staff_id: Option<i32>,
    /// Defaults to today
    pub loan_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

impl CreateLoan {
    /// Resolve the loan date against `today`
    pub fn into_new_loan(self, today: NaiveDate) -> NewLoan {
        NewLoan {
            member_id: self.member_id,
            book_id: self.book_id,
            staff_id: self.staff_id,
            loan_date: self.loan_date.unwrap_or(today),
            due_date: self.due_date,
            notes: self.notes,
        }
    }
}

/// A borrow with every date resolved, as handed to the loan ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub member_id: i32,
    pub book_id: i32,
    pub staff_id: Option<i32>,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

/// Loan listing row, joined with member and book
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanListing {
    pub transaction_id: i32,
    pub member_id: i32,
    pub member_name: String,
    pub membership_number: String,
    pub book_id: i32,
    pub title: String,
    pub isbn: String,
    pub staff_id: Option<i32>,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub loan_status: LoanStatus,
    pub display_status: DisplayStatus,
    pub notes: Option<String>,
}

#[derive(Debug, FromRow)]
pub(crate) struct LoanListingRow {
    pub transaction_id: i32,
    pub member_id: i32,
    pub member_name: String,
    pub membership_number: String,
    pub book_id: i32,
    pub title: String,
    pub isbn: String,
    pub staff_id: Option<i32>,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub loan_status: LoanStatus,
    pub notes: Option<String>,
}

impl LoanListingRow {
    pub fn into_listing(self, today: NaiveDate) -> LoanListing {
        LoanListing {
            display_status: self.loan_status.display(self.due_date, today),
            transaction_id: self.transaction_id,
            member_id: self.member_id,
            member_name: self.member_name,
            membership_number: self.membership_number,
            book_id: self.book_id,
            title: self.title,
            isbn: self.isbn,
            staff_id: self.staff_id,
            loan_date: self.loan_date,
            due_date: self.due_date,
            return_date: self.return_date,
            loan_status: self.loan_status,
            notes: self.notes,
        }
    }
}

/// Recent loan shown on a member's detail page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanHistoryEntry {
    pub transaction_id: i32,
    pub book_id: i32,
    pub title: String,
    pub isbn: String,
    pub authors: Vec<String>,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub loan_status: LoanStatus,
    pub display_status: DisplayStatus,
}

#[derive(Debug, FromRow)]
pub(crate) struct LoanHistoryRow {
    pub transaction_id: i32,
    pub book_id: i32,
    pub title: String,
    pub isbn: String,
    pub authors: Vec<String>,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub loan_status: LoanStatus,
}

impl LoanHistoryRow {
    pub fn into_entry(self, today: NaiveDate) -> LoanHistoryEntry {
        LoanHistoryEntry {
            display_status: self.loan_status.display(self.due_date, today),
            transaction_id: self.transaction_id,
            book_id: self.book_id,
            title: self.title,
            isbn: self.isbn,
            authors: self.authors,
            loan_date: self.loan_date,
            due_date: self.due_date,
            return_date: self.return_date,
            loan_status: self.loan_status,
        }
    }
}

/// Loan listing query parameters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    /// At most `i64::MAX / 100`
    #[validate(range(min = 1, max = 92_233_720_368_547_758i64))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    pub member_id: Option<i32>,
    /// Stored status (Active, Returned, Overdue, Lost, Damaged)
    pub status: Option<LoanStatus>,
}

impl LoanQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Due date must fall strictly after the loan date
pub fn check_due_date(loan_date: NaiveDate, due_date: NaiveDate) -> Result<(), ValidationError> {
    if due_date <= loan_date {
        let mut err = ValidationError::new("due_date");
        err.message = Some("Due date must be after loan date".into());
        return Err(err);
    }
    Ok(())
}

fn validate_create_loan(loan: &CreateLoan) -> Result<(), ValidationError> {
    let loan_date = loan.loan_date.unwrap_or_else(|| Utc::now().date_naive());
    check_due_date(loan_date, loan.due_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_date_must_follow_loan_date() {
        let loan = CreateLoan {
            member_id: 1,
            book_id: 1,
            staff_id: None,
            loan_date: Some(date(2024, 3, 10)),
            due_date: date(2024, 3, 10),
            notes: None,
        };
        assert!(loan.validate().is_err());

        let loan = CreateLoan {
            due_date: date(2024, 3, 24),
            ..loan
        };
        assert!(loan.validate().is_ok());
    }

    #[test]
    fn test_loan_date_defaults_to_today() {
        let today = date(2024, 5, 1);
        let loan = CreateLoan {
            member_id: 2,
            book_id: 7,
            staff_id: Some(1),
            loan_date: None,
            due_date: date(2024, 5, 15),
            notes: None,
        }
        .into_new_loan(today);
        assert_eq!(loan.loan_date, today);
        assert_eq!(loan.staff_id, Some(1));
    }

    #[test]
    fn test_listing_row_derives_display_status() {
        let row = LoanListingRow {
            transaction_id: 1,
            member_id: 1,
            member_name: "Ada Lovelace".into(),
            membership_number: "M001".into(),
            book_id: 1,
            title: "Notes".into(),
            isbn: "9780000000001".into(),
            staff_id: None,
            loan_date: date(2024, 3, 1),
            due_date: date(2024, 3, 5),
            return_date: None,
            loan_status: LoanStatus::Active,
            notes: None,
        };
        let listing = row.into_listing(date(2024, 3, 6));
        assert_eq!(listing.display_status, DisplayStatus::Overdue);
        assert_eq!(listing.loan_status, LoanStatus::Active);
    }

    #[test]
    fn test_status_filter_parses_labels() {
        let query: LoanQuery = serde_json::from_str(r#"{"status": "Returned"}"#).unwrap();
        assert_eq!(query.status, Some(LoanStatus::Returned));
        assert!(serde_json::from_str::<LoanQuery>(r#"{"status": "Gone"}"#).is_err());
    }
}
