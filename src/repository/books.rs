//! Books repository for database operations

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use super::contains_pattern;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{
            AuthorLink, BookAuthor, BookDetail, BookQuery, BookStock, BookSummary, CreateBook,
            UpdateBook, DEFAULT_LANGUAGE,
        },
        pagination::{Page, PageRequest},
    },
};

const DUPLICATE_ISBN: &str = "Book with this ISBN already exists";

const SUMMARY_COLUMNS: &str = r#"
    SELECT b.book_id, b.isbn, b.title, b.subtitle, b.publication_date, b.edition, b.pages,
           b.language, b.book_condition, b.location_shelf, b.total_copies, b.available_copies,
           b.price, c.category_name, p.publisher_name,
           ARRAY(
               SELECT a.first_name || ' ' || a.last_name
               FROM book_authors ba
               JOIN authors a ON a.author_id = ba.author_id
               WHERE ba.book_id = b.book_id
               ORDER BY a.last_name, a.first_name
           ) AS authors,
           b.created_at, b.updated_at
    FROM books b
    LEFT JOIN categories c ON c.category_id = b.category_id
    LEFT JOIN publishers p ON p.publisher_id = b.publisher_id
    WHERE TRUE"#;

const COUNT_FROM: &str = r#"
    SELECT COUNT(*)
    FROM books b
    LEFT JOIN categories c ON c.category_id = b.category_id
    WHERE TRUE"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &BookQuery) {
    if let Some(pattern) = contains_pattern(query.search.as_deref()) {
        qb.push(" AND (b.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR b.isbn ILIKE ")
            .push_bind(pattern.clone())
            .push(
                " OR EXISTS (SELECT 1 FROM book_authors ba JOIN authors a ON a.author_id = ba.author_id \
                 WHERE ba.book_id = b.book_id AND (a.first_name || ' ' || a.last_name) ILIKE ",
            )
            .push_bind(pattern)
            .push("))");
    }
    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        qb.push(" AND c.category_name = ").push_bind(category.to_string());
    }
    match query.available {
        Some(true) => {
            qb.push(" AND b.available_copies > 0");
        }
        Some(false) => {
            qb.push(" AND b.available_copies = 0");
        }
        None => {}
    }
}

fn list_query(query: &BookQuery, page: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SUMMARY_COLUMNS);
    push_filters(&mut qb, query);
    qb.push(" ORDER BY b.title, b.book_id LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}

fn count_query(query: &BookQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(COUNT_FROM);
    push_filters(&mut qb, query);
    qb
}

async fn insert_author_links(
    conn: &mut PgConnection,
    book_id: i32,
    links: &[AuthorLink],
) -> AppResult<()> {
    for link in links {
        sqlx::query("INSERT INTO book_authors (book_id, author_id, author_role) VALUES ($1, $2, $3)")
            .bind(book_id)
            .bind(link.author_id)
            .bind(link.role())
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::from_write(e, "Author is already linked to this book"))?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Filtered, paginated book listing ordered by title
    pub async fn search(&self, query: &BookQuery) -> AppResult<Page<BookSummary>> {
        let page = query.page_request();

        let mut count = count_query(query);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut list = list_query(query, page);
        let rows = list
            .build_query_as::<BookSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, page, total))
    }

    /// Get book by ID with category, publisher and authors
    pub async fn get_detail(&self, id: i32) -> AppResult<BookDetail> {
        let mut detail = sqlx::query_as::<_, BookDetail>(
            r#"
            SELECT b.*, c.category_name, p.publisher_name, p.address AS publisher_address
            FROM books b
            LEFT JOIN categories c ON c.category_id = b.category_id
            LEFT JOIN publishers p ON p.publisher_id = b.publisher_id
            WHERE b.book_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        detail.authors = self.get_authors(id).await?;
        Ok(detail)
    }

    /// Authors credited on a book, ordered by last then first name
    pub async fn get_authors(&self, book_id: i32) -> AppResult<Vec<BookAuthor>> {
        let authors = sqlx::query_as::<_, BookAuthor>(
            r#"
            SELECT a.author_id, a.first_name || ' ' || a.last_name AS name, ba.author_role AS role
            FROM book_authors ba
            JOIN authors a ON a.author_id = ba.author_id
            WHERE ba.book_id = $1
            ORDER BY a.last_name, a.first_name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    /// Create a book together with its author links
    pub async fn create(&self, book: &CreateBook) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        let book_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (
                isbn, title, subtitle, publication_date, edition, pages, language,
                book_condition, location_shelf, total_copies, available_copies, price,
                publisher_id, category_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING book_id
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.subtitle)
        .bind(book.publication_date)
        .bind(book.edition.unwrap_or(1))
        .bind(book.pages)
        .bind(book.language.as_deref().unwrap_or(DEFAULT_LANGUAGE))
        .bind(book.book_condition.unwrap_or_default())
        .bind(&book.location_shelf)
        .bind(book.total_copies)
        .bind(book.initial_available_copies())
        .bind(book.price)
        .bind(book.publisher_id)
        .bind(book.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_ISBN))?;

        insert_author_links(&mut tx, book_id, &book.authors).await?;

        tx.commit().await?;
        Ok(book_id)
    }

    /// Apply a partial update. A new `total_copies` shifts `available_copies`
    /// by the same amount; author links are replaced when given.
    pub async fn update(&self, id: i32, patch: &UpdateBook) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let stock = sqlx::query_as::<_, BookStock>(
            "SELECT book_id, total_copies, available_copies FROM books WHERE book_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        let available = shifted_availability(&stock, patch.total_copies)?;

        sqlx::query(
            r#"
            UPDATE books SET
                isbn = COALESCE($2, isbn),
                title = COALESCE($3, title),
                subtitle = COALESCE($4, subtitle),
                publication_date = COALESCE($5, publication_date),
                edition = COALESCE($6, edition),
                pages = COALESCE($7, pages),
                language = COALESCE($8, language),
                book_condition = COALESCE($9, book_condition),
                location_shelf = COALESCE($10, location_shelf),
                total_copies = COALESCE($11, total_copies),
                available_copies = $12,
                price = COALESCE($13, price),
                publisher_id = COALESCE($14, publisher_id),
                category_id = COALESCE($15, category_id),
                updated_at = NOW()
            WHERE book_id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.isbn)
        .bind(&patch.title)
        .bind(&patch.subtitle)
        .bind(patch.publication_date)
        .bind(patch.edition)
        .bind(patch.pages)
        .bind(&patch.language)
        .bind(patch.book_condition)
        .bind(&patch.location_shelf)
        .bind(patch.total_copies)
        .bind(available)
        .bind(patch.price)
        .bind(patch.publisher_id)
        .bind(patch.category_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_ISBN))?;

        if let Some(authors) = &patch.authors {
            sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_author_links(&mut tx, id, authors).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Availability after moving `total_copies` to `new_total`
pub fn shifted_availability(stock: &BookStock, new_total: Option<i32>) -> AppResult<i32> {
    let Some(new_total) = new_total else {
        return Ok(stock.available_copies);
    };
    let available = stock.available_copies + (new_total - stock.total_copies);
    if available < 0 {
        return Err(AppError::BusinessRule(format!(
            "Cannot reduce total copies to {}: {} copies are on loan",
            new_total,
            stock.total_copies - stock.available_copies
        )));
    }
    Ok(available)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_matches_title_isbn_and_authors() {
        let query = BookQuery {
            search: Some("gatsby".into()),
            ..Default::default()
        };
        let count = count_query(&query);
        let sql = count.sql();
        assert!(sql.contains("b.title ILIKE $1 OR b.isbn ILIKE $2 OR EXISTS"));
        assert!(sql.contains("(a.first_name || ' ' || a.last_name) ILIKE $3"));
    }

    #[test]
    fn test_blank_search_adds_no_constraint() {
        let query = BookQuery {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert!(!count_query(&query).sql().contains("ILIKE"));
    }

    #[test]
    fn test_category_and_availability_filters() {
        let query = BookQuery {
            category: Some("Fiction".into()),
            available: Some(true),
            ..Default::default()
        };
        let list = list_query(&query, query.page_request());
        let sql = list.sql();
        assert!(sql.contains("AND c.category_name = $1 AND b.available_copies > 0 ORDER BY b.title, b.book_id LIMIT $2 OFFSET $3"));

        let query = BookQuery {
            available: Some(false),
            ..Default::default()
        };
        assert!(count_query(&query).sql().ends_with("AND b.available_copies = 0"));
    }

    #[test]
    fn test_total_copies_shift_availability() {
        let stock = BookStock {
            book_id: 1,
            total_copies: 5,
            available_copies: 2,
        };
        assert_eq!(shifted_availability(&stock, None).unwrap(), 2);
        assert_eq!(shifted_availability(&stock, Some(7)).unwrap(), 4);
        assert_eq!(shifted_availability(&stock, Some(3)).unwrap(), 0);
        assert!(matches!(
            shifted_availability(&stock, Some(2)),
            Err(AppError::BusinessRule(_))
        ));
    }
}
