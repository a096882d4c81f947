//! Reference data service

use crate::{
    error::AppResult,
    models::catalog::{Author, Category, Publisher},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn categories(&self) -> AppResult<Vec<Category>> {
        self.repository.catalog.categories().await
    }

    pub async fn publishers(&self) -> AppResult<Vec<Publisher>> {
        self.repository.catalog.publishers().await
    }

    pub async fn authors(&self, search: Option<&str>) -> AppResult<Vec<Author>> {
        self.repository.catalog.authors(search).await
    }
}
