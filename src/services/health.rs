//! Database liveness probe

use crate::repository::Repository;

#[derive(Clone)]
pub struct HealthService {
    repository: Repository,
}

impl HealthService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// `true` when the database answers a trivial query
    pub async fn database_ok(&self) -> bool {
        match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.repository.pool)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Database health probe failed: {}", e);
                false
            }
        }
    }
}
