//! Book model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::enums::BookCondition;
use super::pagination::PageRequest;

pub const DEFAULT_AUTHOR_ROLE: &str = "Primary Author";
pub const DEFAULT_LANGUAGE: &str = "English";

/// Book row as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub book_id: i32,
    pub isbn: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub edition: i32,
    pub pages: Option<i32>,
    pub language: String,
    pub book_condition: BookCondition,
    pub location_shelf: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub price: Option<Decimal>,
    pub publisher_id: Option<i32>,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book as shown in listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub book_id: i32,
    pub isbn: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub edition: i32,
    pub pages: Option<i32>,
    pub language: String,
    pub book_condition: BookCondition,
    pub location_shelf: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub price: Option<Decimal>,
    pub category_name: Option<String>,
    pub publisher_name: Option<String>,
    /// Author full names, ordered by last then first name
    pub authors: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author credited on a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookAuthor {
    pub author_id: i32,
    pub name: String,
    pub role: String,
}

/// Book with its category, publisher and structured author list
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub book: Book,
    pub category_name: Option<String>,
    pub publisher_name: Option<String>,
    pub publisher_address: Option<String>,
    #[sqlx(skip)]
    pub authors: Vec<BookAuthor>,
}

/// Availability counters of a book, read under lock by the loan ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct BookStock {
    pub book_id: i32,
    pub total_copies: i32,
    pub available_copies: i32,
}

/// Author link supplied when creating or updating a book
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AuthorLink {
    pub author_id: i32,
    /// Defaults to "Primary Author"
    pub role: Option<String>,
}

impl AuthorLink {
    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_AUTHOR_ROLE)
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_book"))]
pub struct CreateBook {
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 200))]
    pub subtitle: Option<String>,
    pub publication_date: Option<NaiveDate>,
    #[validate(range(min = 1))]
    pub edition: Option<i32>,
    #[validate(range(min = 1))]
    pub pages: Option<i32>,
    #[validate(length(max = 30))]
    pub language: Option<String>,
    pub book_condition: Option<BookCondition>,
    #[validate(length(max = 20))]
    pub location_shelf: Option<String>,
    #[validate(range(min = 1))]
    pub total_copies: i32,
    /// Defaults to `total_copies`
    #[validate(range(min = 0))]
    pub available_copies: Option<i32>,
    pub price: Option<Decimal>,
    pub publisher_id: Option<i32>,
    #[validate(range(min = 1))]
    pub category_id: i32,
    #[serde(default)]
    pub authors: Vec<AuthorLink>,
}

impl CreateBook {
    pub fn initial_available_copies(&self) -> i32 {
        self.available_copies.unwrap_or(self.total_copies)
    }
}

/// Partial book update. Availability is not writable here: it only moves
/// through loans, or by the same delta as `total_copies`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_update_book"))]
pub struct UpdateBook {
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 200))]
    pub subtitle: Option<String>,
    pub publication_date: Option<NaiveDate>,
    #[validate(range(min = 1))]
    pub edition: Option<i32>,
    #[validate(range(min = 1))]
    pub pages: Option<i32>,
    #[validate(length(max = 30))]
    pub language: Option<String>,
    pub book_condition: Option<BookCondition>,
    #[validate(length(max = 20))]
    pub location_shelf: Option<String>,
    #[validate(range(min = 1))]
    pub total_copies: Option<i32>,
    pub price: Option<Decimal>,
    pub publisher_id: Option<i32>,
    #[validate(range(min = 1))]
    pub category_id: Option<i32>,
    /// Replaces every author link when present
    pub authors: Option<Vec<AuthorLink>>,
}

/// Book listing query parameters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// At most `i64::MAX / 100`
    #[validate(range(min = 1, max = 92_233_720_368_547_758i64))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// Case-insensitive match on title, ISBN or author name
    pub search: Option<String>,
    /// Exact category name
    pub category: Option<String>,
    /// `true`: at least one copy on the shelf, `false`: none left
    pub available: Option<bool>,
}

impl BookQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn check_price(price: Option<Decimal>) -> Result<(), ValidationError> {
    match price {
        Some(p) if p < Decimal::ZERO => Err(invalid("price", "Price cannot be negative")),
        _ => Ok(()),
    }
}

fn check_authors(authors: &[AuthorLink]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for link in authors {
        if link.author_id <= 0 {
            return Err(invalid("authors", "Author id must be positive"));
        }
        if !seen.insert(link.author_id) {
            return Err(invalid("authors", "Author listed more than once"));
        }
    }
    Ok(())
}

fn validate_create_book(book: &CreateBook) -> Result<(), ValidationError> {
    if let Some(available) = book.available_copies {
        if available > book.total_copies {
            return Err(invalid(
                "available_copies",
                "Available copies cannot exceed total copies",
            ));
        }
    }
    check_price(book.price)?;
    check_authors(&book.authors)
}

fn validate_update_book(book: &UpdateBook) -> Result<(), ValidationError> {
    check_price(book.price)?;
    match &book.authors {
        Some(authors) => check_authors(authors),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book() -> CreateBook {
        CreateBook {
            isbn: "978-0-123456-78-9".to_string(),
            title: "Test Book".to_string(),
            subtitle: None,
            publication_date: None,
            edition: None,
            pages: None,
            language: None,
            book_condition: None,
            location_shelf: None,
            total_copies: 3,
            available_copies: None,
            price: Some(Decimal::new(2599, 2)),
            publisher_id: Some(1),
            category_id: 1,
            authors: vec![AuthorLink { author_id: 1, role: None }],
        }
    }

    #[test]
    fn test_valid_book_passes() {
        let book = new_book();
        assert!(book.validate().is_ok());
        assert_eq!(book.initial_available_copies(), 3);
        assert_eq!(book.authors[0].role(), DEFAULT_AUTHOR_ROLE);
    }

    #[test]
    fn test_available_cannot_exceed_total() {
        let book = CreateBook {
            available_copies: Some(4),
            ..new_book()
        };
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_isbn_length_and_copies_bounds() {
        let short = CreateBook {
            isbn: "12345".to_string(),
            ..new_book()
        };
        assert!(short.validate().is_err());

        let no_copies = CreateBook {
            total_copies: 0,
            ..new_book()
        };
        assert!(no_copies.validate().is_err());
    }

    #[test]
    fn test_negative_price_and_duplicate_authors_rejected() {
        let negative = CreateBook {
            price: Some(Decimal::new(-1, 0)),
            ..new_book()
        };
        assert!(negative.validate().is_err());

        let duplicated = CreateBook {
            authors: vec![
                AuthorLink { author_id: 2, role: None },
                AuthorLink { author_id: 2, role: Some("Editor".into()) },
            ],
            ..new_book()
        };
        assert!(duplicated.validate().is_err());
    }

    #[test]
    fn test_page_is_bounded_so_offsets_fit() {
        use crate::models::pagination::MAX_PAGE;

        let query = BookQuery {
            page: Some(MAX_PAGE),
            limit: Some(100),
            ..Default::default()
        };
        assert!(query.validate().is_ok());
        assert!(query.page_request().offset() > 0);

        let query = BookQuery {
            page: Some(i64::MAX),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_update_rejects_available_copies_field() {
        let parsed: Result<UpdateBook, _> =
            serde_json::from_str(r#"{"title": "New", "available_copies": 9}"#);
        assert!(parsed.is_err());

        let parsed: UpdateBook = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert!(parsed.validate().is_ok());
    }
}
