//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    api::{books, catalog, health, loans, members, response, stats},
    models,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Management API",
        version = "1.0.0",
        description = "Books, members, loans and reference data of a lending library",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::api_info,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Members
        members::list_members,
        members::get_member,
        members::get_member_fines,
        members::create_member,
        members::update_member,
        members::delete_member,
        // Loans
        loans::create_loan,
        loans::return_loan,
        loans::list_loans,
        // Reference data
        catalog::list_categories,
        catalog::list_publishers,
        catalog::list_authors,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Enums
            models::BookCondition,
            models::Gender,
            models::MembershipType,
            models::LoanStatus,
            models::DisplayStatus,
            models::PaymentStatus,
            // Books
            models::Book,
            models::BookSummary,
            models::BookDetail,
            models::book::BookAuthor,
            models::book::AuthorLink,
            models::book::CreateBook,
            models::book::UpdateBook,
            books::BookCreated,
            // Members
            models::Member,
            models::MemberSummary,
            models::MemberDetail,
            models::member::CreateMember,
            models::member::UpdateMember,
            models::Fine,
            members::MemberCreated,
            // Loans
            models::LoanTransaction,
            models::LoanListing,
            models::loan::LoanHistoryEntry,
            models::loan::CreateLoan,
            loans::LoanCreated,
            // Reference data
            models::Category,
            models::Publisher,
            models::Author,
            // Stats
            stats::DashboardStats,
            // Envelopes
            models::Pagination,
            response::MessageResponse,
            response::BookList,
            response::MemberList,
            response::LoanList,
            response::BookDetailResponse,
            response::BookCreatedResponse,
            response::MemberDetailResponse,
            response::MemberCreatedResponse,
            response::LoanCreatedResponse,
            response::FinesResponse,
            response::CategoriesResponse,
            response::PublishersResponse,
            response::AuthorsResponse,
            response::StatsResponse,
            // Health
            health::HealthResponse,
            health::ApiInfo,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "members", description = "Member management"),
        (name = "loans", description = "Borrowing and returns"),
        (name = "catalog", description = "Categories, publishers and authors"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/books",
            "/api/books/{id}",
            "/api/members/{id}/fines",
            "/api/loans",
            "/api/loans/{id}/return",
            "/api/authors",
            "/api/stats",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
