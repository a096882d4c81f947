//! Statistics endpoints

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::{error::AppResult, AppState};

use super::response::{ApiResponse, StatsResponse};

/// Dashboard statistics
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct DashboardStats {
    /// Number of catalogued titles
    pub total_books: i64,
    /// Copies currently on the shelf, over all titles
    pub available_books: i64,
    /// Members with an active account
    pub total_members: i64,
    pub active_loans: i64,
    /// Active loans past their due date
    pub overdue_loans: i64,
    /// Unpaid fine balance
    pub outstanding_fines: Decimal,
}

/// Get dashboard statistics
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = StatsResponse)
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let stats = state.services.stats.dashboard().await?;
    Ok(ApiResponse::ok("Statistics retrieved successfully", stats))
}
