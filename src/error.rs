//! Error types for the library server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable machine-readable codes carried in every error envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    ValidationFailed,
    NotFound,
    MemberNotFound,
    LoanNotFound,
    Conflict,
    BookUnavailable,
    MemberInactive,
    LoanLimitExceeded,
    HasActiveLoans,
    BusinessRule,
    DbFailure,
    Failure,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Request shape or field constraints rejected at the boundary
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Book is not available for loan")]
    BookUnavailable,

    #[error("Member not found")]
    MemberNotFound,

    #[error("Member account is not active")]
    MemberInactive,

    #[error("Member has reached maximum book loan limit ({max})")]
    LoanLimitExceeded { max: i32 },

    #[error("Active loan not found")]
    LoanNotFound,

    #[error("Cannot delete {entity} with active loans")]
    HasActiveLoans { entity: &'static str },

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub message: String,
    /// Machine-readable error code
    pub error: String,
}

impl AppError {
    /// Map a failed write, turning constraint violations into client-facing errors.
    ///
    /// `conflict` is the message reported for a unique-key violation.
    pub fn from_write(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(conflict.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::BadRequest(format!(
                    "Data integrity error: {}",
                    referenced_entity(db_err.constraint())
                ));
            }
            if db_err.is_check_violation() {
                return AppError::BadRequest(format!(
                    "Data integrity error: constraint {} violated",
                    db_err.constraint().unwrap_or("check")
                ));
            }
        }
        AppError::Database(err)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::ValidationFailed,
            AppError::BadRequest(_) => ErrorCode::InvalidInput,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::BookUnavailable => ErrorCode::BookUnavailable,
            AppError::MemberNotFound => ErrorCode::MemberNotFound,
            AppError::MemberInactive => ErrorCode::MemberInactive,
            AppError::LoanLimitExceeded { .. } => ErrorCode::LoanLimitExceeded,
            AppError::LoanNotFound => ErrorCode::LoanNotFound,
            AppError::HasActiveLoans { .. } => ErrorCode::HasActiveLoans,
            AppError::BusinessRule(_) => ErrorCode::BusinessRule,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) | AppError::MemberNotFound | AppError::LoanNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_)
            | AppError::BookUnavailable
            | AppError::MemberInactive
            | AppError::LoanLimitExceeded { .. }
            | AppError::HasActiveLoans { .. }
            | AppError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn referenced_entity(constraint: Option<&str>) -> &'static str {
    let constraint = constraint.unwrap_or_default();
    if constraint.contains("category_id") {
        "category does not exist"
    } else if constraint.contains("publisher_id") {
        "publisher does not exist"
    } else if constraint.contains("author_id") {
        "author does not exist"
    } else if constraint.contains("member_id") {
        "member does not exist"
    } else if constraint.contains("book_id") {
        "book does not exist"
    } else {
        "referenced record does not exist"
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::BusinessRule(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: format!("{:?}", code),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rules_map_to_bad_request() {
        assert_eq!(AppError::BookUnavailable.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MemberInactive.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::LoanLimitExceeded { max: 1 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::HasActiveLoans { entity: "book" }.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_lookup_failures_map_to_not_found() {
        assert_eq!(AppError::LoanNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::MemberNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::NotFound("Book not found".into()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_validation_and_conflict_statuses() {
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::Conflict("dup".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_infrastructure_errors_hide_detail() {
        let err = AppError::Internal("pool exhausted at 10.0.0.3".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_non_database_errors_pass_through_from_write() {
        let err = AppError::from_write(sqlx::Error::RowNotFound, "duplicate");
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_referenced_entity_names() {
        assert_eq!(
            referenced_entity(Some("books_category_id_fkey")),
            "category does not exist"
        );
        assert_eq!(referenced_entity(None), "referenced record does not exist");
    }
}
