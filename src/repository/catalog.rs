//! Reference data repository: categories, publishers, authors

use sqlx::{Pool, Postgres};

use super::contains_pattern;
use crate::{
    error::AppResult,
    models::catalog::{Author, Category, Publisher},
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: Pool<Postgres>,
}

impl CatalogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn categories(&self) -> AppResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY category_name")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    pub async fn publishers(&self) -> AppResult<Vec<Publisher>> {
        let publishers =
            sqlx::query_as::<_, Publisher>("SELECT * FROM publishers ORDER BY publisher_name")
                .fetch_all(&self.pool)
                .await?;
        Ok(publishers)
    }

    /// Authors ordered by last then first name, optionally filtered by name
    pub async fn authors(&self, search: Option<&str>) -> AppResult<Vec<Author>> {
        let authors = match contains_pattern(search) {
            Some(pattern) => {
                sqlx::query_as::<_, Author>(
                    r#"
                    SELECT * FROM authors
                    WHERE first_name ILIKE $1
                       OR last_name ILIKE $1
                       OR (first_name || ' ' || last_name) ILIKE $1
                    ORDER BY last_name, first_name
                    "#,
                )
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Author>("SELECT * FROM authors ORDER BY last_name, first_name")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(authors)
    }
}
