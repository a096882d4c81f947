//! Loan management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppResult, ErrorResponse},
    models::loan::{CreateLoan, LoanListing, LoanQuery},
    AppState,
};

use super::{
    extract::{ValidatedJson, ValidatedQuery},
    response::{ApiResponse, ListResponse, LoanCreatedResponse, LoanList, MessageResponse},
};

/// Identifier of a newly created loan
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoanCreated {
    pub transaction_id: i32,
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/api/loans",
    tag = "loans",
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanCreatedResponse),
        (status = 400, description = "Book unavailable, member inactive or loan limit reached", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<ApiResponse<LoanCreated>>)> {
    let loan = request.into_new_loan(Utc::now().date_naive());
    let transaction_id = state.services.loans.create_loan(&loan).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Book borrowed successfully", LoanCreated { transaction_id }),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    put,
    path = "/api/loans/{id}/return",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan transaction ID")),
    responses(
        (status = 200, description = "Book returned", body = MessageResponse),
        (status = 404, description = "No active loan with this ID", body = ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    Path(transaction_id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.loans.return_loan(transaction_id).await?;
    Ok(MessageResponse::ok("Book returned successfully"))
}

/// List loans, newest first
#[utoipa::path(
    get,
    path = "/api/loans",
    tag = "loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "Paginated list of loans", body = LoanList),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<LoanQuery>,
) -> AppResult<Json<ListResponse<LoanListing>>> {
    let page = state.services.loans.search(&query).await?;
    Ok(ListResponse::ok("Loans retrieved successfully", page))
}
