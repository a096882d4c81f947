//! Uniform response envelopes

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    api::{books::BookCreated, loans::LoanCreated, members::MemberCreated, stats::DashboardStats},
    models::{
        catalog::{Author, Category, Publisher},
        fine::Fine,
        pagination::{Page, Pagination},
        BookDetail, BookSummary, LoanListing, MemberDetail, MemberSummary,
    },
};

/// Success envelope carrying a single payload
#[derive(Serialize, ToSchema)]
#[aliases(
    BookDetailResponse = ApiResponse<BookDetail>,
    BookCreatedResponse = ApiResponse<BookCreated>,
    MemberDetailResponse = ApiResponse<MemberDetail>,
    MemberCreatedResponse = ApiResponse<MemberCreated>,
    LoanCreatedResponse = ApiResponse<LoanCreated>,
    StatsResponse = ApiResponse<DashboardStats>
)]
pub struct ApiResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

/// Success envelope carrying an unpaginated list
#[derive(Serialize, ToSchema)]
#[aliases(
    FinesResponse = CollectionResponse<Fine>,
    CategoriesResponse = CollectionResponse<Category>,
    PublishersResponse = CollectionResponse<Publisher>,
    AuthorsResponse = CollectionResponse<Author>
)]
pub struct CollectionResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub success: bool,
    pub message: String,
    pub data: Vec<T>,
}

impl<T> CollectionResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn ok(message: impl Into<String>, data: Vec<T>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data,
        })
    }
}

/// Success envelope without payload
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    /// Always `null`
    #[schema(value_type = Option<Object>)]
    pub data: Option<()>,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: None,
        })
    }
}

/// Success envelope for paginated listings
#[derive(Serialize, ToSchema)]
#[aliases(
    BookList = ListResponse<BookSummary>,
    MemberList = ListResponse<MemberSummary>,
    LoanList = ListResponse<LoanListing>
)]
pub struct ListResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub success: bool,
    pub message: String,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> ListResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn ok(message: impl Into<String>, page: Page<T>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: page.rows,
            pagination: page.pagination,
        })
    }
}
