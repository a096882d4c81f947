//! Reference data endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::catalog::{Author, AuthorQuery, Category, Publisher},
    AppState,
};

use super::response::{AuthorsResponse, CategoriesResponse, CollectionResponse, PublishersResponse};

/// List book categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "catalog",
    responses((status = 200, description = "Categories ordered by name", body = CategoriesResponse))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<CollectionResponse<Category>>> {
    let categories = state.services.catalog.categories().await?;
    Ok(CollectionResponse::ok("Categories retrieved successfully", categories))
}

/// List publishers
#[utoipa::path(
    get,
    path = "/api/publishers",
    tag = "catalog",
    responses((status = 200, description = "Publishers ordered by name", body = PublishersResponse))
)]
pub async fn list_publishers(
    State(state): State<AppState>,
) -> AppResult<Json<CollectionResponse<Publisher>>> {
    let publishers = state.services.catalog.publishers().await?;
    Ok(CollectionResponse::ok("Publishers retrieved successfully", publishers))
}

/// List authors, optionally filtered by name
#[utoipa::path(
    get,
    path = "/api/authors",
    tag = "catalog",
    params(AuthorQuery),
    responses((status = 200, description = "Authors ordered by last then first name", body = AuthorsResponse))
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<AuthorQuery>,
) -> AppResult<Json<CollectionResponse<Author>>> {
    let authors = state
        .services
        .catalog
        .authors(query.search.as_deref())
        .await?;
    Ok(CollectionResponse::ok("Authors retrieved successfully", authors))
}
