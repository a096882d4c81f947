//! Business logic services

pub mod books;
pub mod catalog;
pub mod health;
pub mod loans;
pub mod members;
pub mod stats;

use std::sync::Arc;

use crate::repository::{LoanStore, Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub members: members::MembersService,
    pub loans: loans::LoansService,
    pub catalog: catalog::CatalogService,
    pub health: health::HealthService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services over the repository and the loan ledger
    pub fn new(repository: Repository, store: Arc<dyn LoanStore>) -> Self {
        let loans = loans::LoansService::new(repository.clone(), store);
        let lifecycle = loans.lifecycle().clone();
        Self {
            books: books::BooksService::new(repository.clone(), lifecycle.clone()),
            members: members::MembersService::new(repository.clone(), lifecycle),
            catalog: catalog::CatalogService::new(repository.clone()),
            health: health::HealthService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
            loans,
        }
    }
}
