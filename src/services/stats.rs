//! Statistics service

use crate::{api::stats::DashboardStats, error::AppResult, repository::Repository};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Dashboard counters over books, members, loans and fines
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS total_books,
                (SELECT COALESCE(SUM(available_copies), 0)::BIGINT FROM books) AS available_books,
                (SELECT COUNT(*) FROM members WHERE is_active) AS total_members,
                (SELECT COUNT(*) FROM loan_transactions
                 WHERE loan_status = 'Active') AS active_loans,
                (SELECT COUNT(*) FROM loan_transactions
                 WHERE loan_status = 'Active' AND due_date < CURRENT_DATE) AS overdue_loans,
                (SELECT COALESCE(SUM(amount - paid_amount), 0) FROM fines
                 WHERE payment_status = 'Unpaid') AS outstanding_fines
            "#,
        )
        .fetch_one(&self.repository.pool)
        .await?;
        Ok(stats)
    }
}
