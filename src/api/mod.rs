//! API handlers for the library REST endpoints

pub mod books;
pub mod catalog;
pub mod extract;
pub mod health;
pub mod loans;
pub mod members;
pub mod openapi;
pub mod response;
pub mod stats;

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Members
        .route("/members", get(members::list_members).post(members::create_member))
        .route(
            "/members/:id",
            get(members::get_member)
                .put(members::update_member)
                .delete(members::delete_member),
        )
        .route("/members/:id/fines", get(members::get_member_fines))
        // Loans
        .route("/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/loans/:id/return", put(loans::return_loan))
        // Reference data
        .route("/categories", get(catalog::list_categories))
        .route("/publishers", get(catalog::list_publishers))
        .route("/authors", get(catalog::list_authors))
        // Statistics
        .route("/stats", get(stats::get_stats));

    Router::new()
        .route("/", get(health::api_info))
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CompressionLayer::new())
}
