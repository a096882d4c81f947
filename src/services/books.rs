//! Book catalog service

use crate::{
    error::AppResult,
    models::{
        book::{BookDetail, BookQuery, BookSummary, CreateBook, UpdateBook},
        pagination::Page,
    },
    repository::Repository,
};

use super::loans::LoanLifecycle;

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    lifecycle: LoanLifecycle,
}

impl BooksService {
    pub fn new(repository: Repository, lifecycle: LoanLifecycle) -> Self {
        Self {
            repository,
            lifecycle,
        }
    }

    /// Search books with filters
    pub async fn search(&self, query: &BookQuery) -> AppResult<Page<BookSummary>> {
        self.repository.books.search(query).await
    }

    /// Get book by ID with full details
    pub async fn get(&self, id: i32) -> AppResult<BookDetail> {
        self.repository.books.get_detail(id).await
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<i32> {
        let book_id = self.repository.books.create(book).await?;
        tracing::info!(book_id, isbn = %book.isbn, "Book created");
        Ok(book_id)
    }

    /// Update an existing book
    pub async fn update(&self, id: i32, patch: &UpdateBook) -> AppResult<()> {
        self.repository.books.update(id, patch).await?;
        tracing::info!(book_id = id, "Book updated");
        Ok(())
    }

    /// Delete a book with no active loan
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.lifecycle.delete_book(id).await
    }
}
