//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppResult, ErrorResponse},
    models::book::{BookDetail, BookQuery, BookSummary, CreateBook, UpdateBook},
    AppState,
};

use super::{
    extract::{ValidatedJson, ValidatedQuery},
    response::{
        ApiResponse, BookCreatedResponse, BookDetailResponse, BookList, ListResponse,
        MessageResponse,
    },
};

/// Identifier of a newly created book
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookCreated {
    pub book_id: i32,
}

/// List books with search, filters and pagination
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Paginated list of books", body = BookList),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<BookQuery>,
) -> AppResult<Json<ListResponse<BookSummary>>> {
    let page = state.services.books.search(&query).await?;
    Ok(ListResponse::ok("Books retrieved successfully", page))
}

/// Get book details with authors
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetailResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BookDetail>>> {
    let book = state.services.books.get(id).await?;
    Ok(ApiResponse::ok("Book retrieved successfully", book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookCreatedResponse),
        (status = 400, description = "Unknown category, publisher or author", body = ErrorResponse),
        (status = 409, description = "ISBN already exists", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ValidatedJson(book): ValidatedJson<CreateBook>,
) -> AppResult<(StatusCode, Json<ApiResponse<BookCreated>>)> {
    let book_id = state.services.books.create(&book).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Book created successfully", BookCreated { book_id }),
    ))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = MessageResponse),
        (status = 400, description = "Copies on loan exceed the new total", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 409, description = "ISBN already exists", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(patch): ValidatedJson<UpdateBook>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.update(id, &patch).await?;
    Ok(MessageResponse::ok("Book updated successfully"))
}

/// Delete a book with no active loan
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 400, description = "Book has active loans", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.delete(id).await?;
    Ok(MessageResponse::ok("Book deleted successfully"))
}
