//! Loans repository: the PostgreSQL loan ledger and loan listings

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use super::ledger::{ActiveLoan, LoanStore, LoanTx};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookStock,
        loan::{LoanListing, LoanListingRow, LoanQuery, NewLoan},
        member::MemberStanding,
        pagination::{Page, PageRequest},
    },
};

const LISTING_COLUMNS: &str = r#"
    SELECT lt.transaction_id, lt.member_id,
           m.first_name || ' ' || m.last_name AS member_name,
           m.membership_number,
           lt.book_id, b.title, b.isbn, lt.staff_id,
           lt.loan_date, lt.due_date, lt.return_date, lt.loan_status, lt.notes
    FROM loan_transactions lt
    JOIN members m ON m.member_id = lt.member_id
    JOIN books b ON b.book_id = lt.book_id
    WHERE TRUE"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &LoanQuery) {
    if let Some(member_id) = query.member_id {
        qb.push(" AND lt.member_id = ").push_bind(member_id);
    }
    if let Some(status) = query.status {
        qb.push(" AND lt.loan_status = ").push_bind(status);
    }
}

fn list_query(query: &LoanQuery, page: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(LISTING_COLUMNS);
    push_filters(&mut qb, query);
    qb.push(" ORDER BY lt.loan_date DESC, lt.transaction_id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}

fn count_query(query: &LoanQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM loan_transactions lt WHERE TRUE");
    push_filters(&mut qb, query);
    qb
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Filtered, paginated loan listing, newest first
    pub async fn search(&self, query: &LoanQuery) -> AppResult<Page<LoanListing>> {
        let page = query.page_request();

        let mut count = count_query(query);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let today = Utc::now().date_naive();
        let mut list = list_query(query, page);
        let rows = list
            .build_query_as::<LoanListingRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.into_listing(today))
            .collect();

        Ok(Page::new(rows, page, total))
    }
}

/// Loan ledger over PostgreSQL transactions with row locks
#[derive(Clone)]
pub struct PgLoanStore {
    pool: Pool<Postgres>,
}

impl PgLoanStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStore for PgLoanStore {
    async fn begin(&self) -> AppResult<Box<dyn LoanTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLoanTx { tx }))
    }
}

/// Rolls back when dropped uncommitted
pub struct PgLoanTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LoanTx for PgLoanTx {
    async fn book_for_update(&mut self, book_id: i32) -> AppResult<Option<BookStock>> {
        let stock = sqlx::query_as::<_, BookStock>(
            "SELECT book_id, total_copies, available_copies FROM books WHERE book_id = $1 FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(stock)
    }

    async fn member_for_update(&mut self, member_id: i32) -> AppResult<Option<MemberStanding>> {
        let standing = sqlx::query_as::<_, MemberStanding>(
            "SELECT member_id, is_active, max_books_allowed FROM members WHERE member_id = $1 FOR UPDATE",
        )
        .bind(member_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(standing)
    }

    async fn active_loan_for_update(
        &mut self,
        transaction_id: i32,
    ) -> AppResult<Option<ActiveLoan>> {
        let loan = sqlx::query_as::<_, ActiveLoan>(
            r#"
            SELECT transaction_id, member_id, book_id
            FROM loan_transactions
            WHERE transaction_id = $1 AND loan_status = 'Active'
            FOR UPDATE
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(loan)
    }

    async fn count_active_loans_for_member(&mut self, member_id: i32) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM loan_transactions WHERE member_id = $1 AND loan_status = 'Active'",
        )
        .bind(member_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn count_active_loans_for_book(&mut self, book_id: i32) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM loan_transactions WHERE book_id = $1 AND loan_status = 'Active'",
        )
        .bind(book_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO loan_transactions
                (member_id, book_id, staff_id, loan_date, due_date, loan_status, notes)
            VALUES ($1, $2, $3, $4, $5, 'Active', $6)
            RETURNING transaction_id
            "#,
        )
        .bind(loan.member_id)
        .bind(loan.book_id)
        .bind(loan.staff_id)
        .bind(loan.loan_date)
        .bind(loan.due_date)
        .bind(&loan.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| AppError::from_write(e, "Loan transaction already exists"))
    }

    async fn adjust_available_copies(&mut self, book_id: i32, delta: i32) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + $2, updated_at = NOW()
            WHERE book_id = $1
              AND available_copies + $2 BETWEEN 0 AND total_copies
            "#,
        )
        .bind(book_id)
        .bind(delta)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_returned(
        &mut self,
        transaction_id: i32,
        return_date: NaiveDate,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE loan_transactions
            SET loan_status = 'Returned', return_date = $2, updated_at = NOW()
            WHERE transaction_id = $1 AND loan_status = 'Active'
            "#,
        )
        .bind(transaction_id)
        .bind(return_date)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn deactivate_member(&mut self, member_id: i32) -> AppResult<()> {
        sqlx::query("UPDATE members SET is_active = FALSE, updated_at = NOW() WHERE member_id = $1")
            .bind(member_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_book(&mut self, book_id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM books WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| AppError::from_write(e, "Book is still referenced"))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::LoanStatus;

    #[test]
    fn test_unfiltered_listing_orders_newest_first() {
        let query = LoanQuery::default();
        let qb = list_query(&query, query.page_request());
        let sql = qb.sql();
        assert!(!sql.contains("lt.member_id ="));
        assert!(sql.ends_with("ORDER BY lt.loan_date DESC, lt.transaction_id DESC LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_filters_combine_with_and() {
        let query = LoanQuery {
            member_id: Some(4),
            status: Some(LoanStatus::Active),
            ..Default::default()
        };
        let list = list_query(&query, query.page_request());
        assert!(list
            .sql()
            .contains("AND lt.member_id = $1 AND lt.loan_status = $2 ORDER BY"));

        let count = count_query(&query);
        assert_eq!(
            count.sql(),
            "SELECT COUNT(*) FROM loan_transactions lt WHERE TRUE AND lt.member_id = $1 AND lt.loan_status = $2"
        );
    }
}
