//! Repository layer for database operations

pub mod books;
pub mod catalog;
pub mod ledger;
pub mod loans;
pub mod members;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use sqlx::{Pool, Postgres};

pub use ledger::{ActiveLoan, LoanStore, LoanTx};
pub use loans::PgLoanStore;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryLoanStore;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub members: members::MembersRepository,
    pub loans: loans::LoansRepository,
    pub catalog: catalog::CatalogRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            members: members::MembersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            catalog: catalog::CatalogRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Escape `\`, `%` and `_` so they match literally in a LIKE pattern
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Substring pattern for a search term. Blank terms give `None`.
pub fn contains_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;
    Some(format!("%{}%", escape_like(term)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcards_match_literally() {
        assert_eq!(escape_like("100%_off"), "100\\%\\_off");
        assert_eq!(escape_like(r"C:\path"), r"C:\\path");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern(Some("  Gatsby ")), Some("%Gatsby%".to_string()));
        assert_eq!(contains_pattern(Some("50%")), Some("%50\\%%".to_string()));
        assert_eq!(contains_pattern(Some("   ")), None);
        assert_eq!(contains_pattern(None), None);
    }
}
