//! Loan management service

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{LoanListing, LoanQuery, NewLoan},
        pagination::Page,
    },
    repository::{LoanStore, Repository},
};

/// Borrow, return and guarded deletion over a [`LoanStore`].
///
/// Each operation checks its preconditions and applies its effects inside
/// one unit; any failure leaves the store untouched.
#[derive(Clone)]
pub struct LoanLifecycle {
    store: Arc<dyn LoanStore>,
}

impl LoanLifecycle {
    pub fn new(store: Arc<dyn LoanStore>) -> Self {
        Self { store }
    }

    /// Lend one copy of a book to a member and return the transaction id
    pub async fn borrow(&self, loan: &NewLoan) -> AppResult<i32> {
        if loan.due_date <= loan.loan_date {
            return Err(AppError::BadRequest(
                "Due date must be after loan date".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;

        let stock = tx.book_for_update(loan.book_id).await?;
        if !stock.is_some_and(|s| s.available_copies > 0) {
            tracing::debug!(book_id = loan.book_id, "Borrow rejected: no copy available");
            return Err(AppError::BookUnavailable);
        }

        let member = tx
            .member_for_update(loan.member_id)
            .await?
            .ok_or(AppError::MemberNotFound)?;
        if !member.is_active {
            tracing::debug!(member_id = member.member_id, "Borrow rejected: member inactive");
            return Err(AppError::MemberInactive);
        }

        let active = tx.count_active_loans_for_member(member.member_id).await?;
        if active >= i64::from(member.max_books_allowed) {
            tracing::debug!(
                member_id = member.member_id,
                active,
                max = member.max_books_allowed,
                "Borrow rejected: loan limit reached"
            );
            return Err(AppError::LoanLimitExceeded {
                max: member.max_books_allowed,
            });
        }

        let transaction_id = tx.insert_loan(loan).await?;
        if !tx.adjust_available_copies(loan.book_id, -1).await? {
            return Err(AppError::BookUnavailable);
        }
        tx.commit().await?;

        tracing::info!(
            transaction_id,
            member_id = loan.member_id,
            book_id = loan.book_id,
            due_date = %loan.due_date,
            "Book borrowed"
        );
        Ok(transaction_id)
    }

    /// Close an active loan and put the copy back on the shelf
    pub async fn return_book(&self, transaction_id: i32, return_date: NaiveDate) -> AppResult<()> {
        let mut tx = self.store.begin().await?;

        let loan = tx
            .active_loan_for_update(transaction_id)
            .await?
            .ok_or(AppError::LoanNotFound)?;

        if !tx.mark_returned(transaction_id, return_date).await? {
            return Err(AppError::LoanNotFound);
        }
        if !tx.adjust_available_copies(loan.book_id, 1).await? {
            tracing::warn!(
                transaction_id,
                book_id = loan.book_id,
                "Return would push availability past total copies"
            );
            return Err(AppError::BusinessRule(
                "Book availability is already at total copies".to_string(),
            ));
        }
        tx.commit().await?;

        tracing::info!(
            transaction_id,
            member_id = loan.member_id,
            book_id = loan.book_id,
            "Book returned"
        );
        Ok(())
    }

    /// Hard-delete a book that has no active loan
    pub async fn delete_book(&self, book_id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;

        tx.book_for_update(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
        if tx.count_active_loans_for_book(book_id).await? > 0 {
            return Err(AppError::HasActiveLoans { entity: "book" });
        }
        tx.delete_book(book_id).await?;
        tx.commit().await?;

        tracing::info!(book_id, "Book deleted");
        Ok(())
    }

    /// Deactivate a member that has no active loan
    pub async fn deactivate_member(&self, member_id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;

        tx.member_for_update(member_id)
            .await?
            .ok_or(AppError::MemberNotFound)?;
        if tx.count_active_loans_for_member(member_id).await? > 0 {
            return Err(AppError::HasActiveLoans { entity: "member" });
        }
        tx.deactivate_member(member_id).await?;
        tx.commit().await?;

        tracing::info!(member_id, "Member deactivated");
        Ok(())
    }
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    lifecycle: LoanLifecycle,
}

impl LoansService {
    pub fn new(repository: Repository, store: Arc<dyn LoanStore>) -> Self {
        Self {
            repository,
            lifecycle: LoanLifecycle::new(store),
        }
    }

    pub fn lifecycle(&self) -> &LoanLifecycle {
        &self.lifecycle
    }

    /// Create a new loan (borrow a book)
    pub async fn create_loan(&self, loan: &NewLoan) -> AppResult<i32> {
        self.lifecycle.borrow(loan).await
    }

    /// Return a borrowed book today
    pub async fn return_loan(&self, transaction_id: i32) -> AppResult<()> {
        self.lifecycle
            .return_book(transaction_id, Utc::now().date_naive())
            .await
    }

    /// Search loans
    pub async fn search(&self, query: &LoanQuery) -> AppResult<Page<LoanListing>> {
        self.repository.loans.search(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{book::BookStock, member::MemberStanding};
    use crate::repository::{ActiveLoan, LoanTx, MemoryLoanStore};
    use async_trait::async_trait;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_loan(member_id: i32, book_id: i32) -> NewLoan {
        NewLoan {
            member_id,
            book_id,
            staff_id: Some(1),
            loan_date: date(2024, 3, 1),
            due_date: date(2024, 3, 15),
            notes: None,
        }
    }

    async fn setup() -> (MemoryLoanStore, LoanLifecycle) {
        let store = MemoryLoanStore::new();
        let lifecycle = LoanLifecycle::new(Arc::new(store.clone()));
        (store, lifecycle)
    }

    async fn available(store: &MemoryLoanStore, book_id: i32) -> i32 {
        store.book(book_id).await.unwrap().available_copies
    }

    #[tokio::test]
    async fn test_borrows_and_returns_balance_availability() {
        let (store, lifecycle) = setup().await;
        store.add_book(1, 5, 5).await;
        for member_id in 1..=4 {
            store.add_member(member_id, 5, true).await;
        }

        let mut ids = Vec::new();
        for member_id in 1..=4 {
            ids.push(lifecycle.borrow(&new_loan(member_id, 1)).await.unwrap());
        }
        assert_eq!(available(&store, 1).await, 1);

        for id in ids {
            lifecycle.return_book(id, date(2024, 3, 10)).await.unwrap();
        }
        assert_eq!(available(&store, 1).await, 5);
    }

    #[tokio::test]
    async fn test_unavailable_book_is_rejected_without_mutation() {
        let (store, lifecycle) = setup().await;
        store.add_book(1, 2, 0).await;
        store.add_member(1, 5, true).await;

        let err = lifecycle.borrow(&new_loan(1, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::BookUnavailable));
        assert_eq!(available(&store, 1).await, 0);
        assert_eq!(store.loan_count().await, 0);

        let err = lifecycle.borrow(&new_loan(1, 99)).await.unwrap_err();
        assert!(matches!(err, AppError::BookUnavailable));
    }

    #[tokio::test]
    async fn test_precondition_order() {
        let (store, lifecycle) = setup().await;
        store.add_book(1, 1, 0).await;
        store.add_member(2, 1, false).await;

        // Bad dates win over everything else
        let bad_dates = NewLoan {
            due_date: date(2024, 3, 1),
            ..new_loan(42, 1)
        };
        assert!(matches!(
            lifecycle.borrow(&bad_dates).await.unwrap_err(),
            AppError::BadRequest(_)
        ));

        // Unavailable book reported before the missing member
        assert!(matches!(
            lifecycle.borrow(&new_loan(42, 1)).await.unwrap_err(),
            AppError::BookUnavailable
        ));

        store.add_book(3, 1, 1).await;
        assert!(matches!(
            lifecycle.borrow(&new_loan(42, 3)).await.unwrap_err(),
            AppError::MemberNotFound
        ));
        assert!(matches!(
            lifecycle.borrow(&new_loan(2, 3)).await.unwrap_err(),
            AppError::MemberInactive
        ));
        assert_eq!(available(&store, 3).await, 1);
    }

    #[tokio::test]
    async fn test_loan_limit_is_enforced() {
        let (store, lifecycle) = setup().await;
        store.add_member(1, 3, true).await;
        for book_id in 1..=4 {
            store.add_book(book_id, 1, 1).await;
        }

        for book_id in 1..=3 {
            lifecycle.borrow(&new_loan(1, book_id)).await.unwrap();
        }
        let err = lifecycle.borrow(&new_loan(1, 4)).await.unwrap_err();
        assert!(matches!(err, AppError::LoanLimitExceeded { max: 3 }));
        assert_eq!(store.active_loans_for_member(1).await, 3);
        assert_eq!(available(&store, 4).await, 1);
    }

    #[tokio::test]
    async fn test_single_loan_member_scenario() {
        let (store, lifecycle) = setup().await;
        store.add_book(1, 3, 3).await;
        store.add_member(1, 1, true).await;

        let first = lifecycle.borrow(&new_loan(1, 1)).await.unwrap();
        assert_eq!(available(&store, 1).await, 2);

        let err = lifecycle.borrow(&new_loan(1, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::LoanLimitExceeded { max: 1 }));

        lifecycle.return_book(first, date(2024, 3, 5)).await.unwrap();
        assert_eq!(available(&store, 1).await, 3);

        lifecycle.borrow(&new_loan(1, 1)).await.unwrap();
        assert_eq!(available(&store, 1).await, 2);
    }

    #[tokio::test]
    async fn test_second_return_fails_and_changes_nothing() {
        let (store, lifecycle) = setup().await;
        store.add_book(1, 2, 2).await;
        store.add_member(1, 5, true).await;

        let id = lifecycle.borrow(&new_loan(1, 1)).await.unwrap();
        lifecycle.return_book(id, date(2024, 3, 4)).await.unwrap();

        let err = lifecycle
            .return_book(id, date(2024, 3, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LoanNotFound));
        assert_eq!(available(&store, 1).await, 2);

        let loan = store.loan(id).await.unwrap();
        assert_eq!(loan.return_date, Some(date(2024, 3, 4)));

        assert!(matches!(
            lifecycle.return_book(999, date(2024, 3, 5)).await.unwrap_err(),
            AppError::LoanNotFound
        ));
    }

    #[tokio::test]
    async fn test_deletion_is_guarded_by_active_loans() {
        let (store, lifecycle) = setup().await;
        store.add_book(1, 1, 1).await;
        store.add_member(1, 5, true).await;

        let id = lifecycle.borrow(&new_loan(1, 1)).await.unwrap();
        assert!(matches!(
            lifecycle.delete_book(1).await.unwrap_err(),
            AppError::HasActiveLoans { entity: "book" }
        ));
        assert!(matches!(
            lifecycle.deactivate_member(1).await.unwrap_err(),
            AppError::HasActiveLoans { entity: "member" }
        ));

        lifecycle.return_book(id, date(2024, 3, 2)).await.unwrap();
        lifecycle.delete_book(1).await.unwrap();
        lifecycle.deactivate_member(1).await.unwrap();

        assert!(store.book(1).await.is_none());
        assert!(!store.member(1).await.unwrap().is_active);
        assert!(matches!(
            lifecycle.delete_book(1).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            lifecycle.deactivate_member(7).await.unwrap_err(),
            AppError::MemberNotFound
        ));
    }

    /// Delegates to the in-memory ledger but fails the availability update
    struct FailingStore(MemoryLoanStore);

    struct FailingTx(Box<dyn LoanTx>);

    #[async_trait]
    impl LoanStore for FailingStore {
        async fn begin(&self) -> AppResult<Box<dyn LoanTx>> {
            Ok(Box::new(FailingTx(self.0.begin().await?)))
        }
    }

    #[async_trait]
    impl LoanTx for FailingTx {
        async fn book_for_update(&mut self, book_id: i32) -> AppResult<Option<BookStock>> {
            self.0.book_for_update(book_id).await
        }
        async fn member_for_update(&mut self, id: i32) -> AppResult<Option<MemberStanding>> {
            self.0.member_for_update(id).await
        }
        async fn active_loan_for_update(&mut self, id: i32) -> AppResult<Option<ActiveLoan>> {
            self.0.active_loan_for_update(id).await
        }
        async fn count_active_loans_for_member(&mut self, id: i32) -> AppResult<i64> {
            self.0.count_active_loans_for_member(id).await
        }
        async fn count_active_loans_for_book(&mut self, id: i32) -> AppResult<i64> {
            self.0.count_active_loans_for_book(id).await
        }
        async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<i32> {
            self.0.insert_loan(loan).await
        }
        async fn adjust_available_copies(&mut self, _book_id: i32, _delta: i32) -> AppResult<bool> {
            Err(AppError::Internal("connection reset".to_string()))
        }
        async fn mark_returned(&mut self, id: i32, on: NaiveDate) -> AppResult<bool> {
            self.0.mark_returned(id, on).await
        }
        async fn deactivate_member(&mut self, id: i32) -> AppResult<()> {
            self.0.deactivate_member(id).await
        }
        async fn delete_book(&mut self, id: i32) -> AppResult<()> {
            self.0.delete_book(id).await
        }
        async fn commit(self: Box<Self>) -> AppResult<()> {
            self.0.commit().await
        }
    }

    #[tokio::test]
    async fn test_failure_after_insert_rolls_back_the_unit() {
        let store = MemoryLoanStore::new();
        store.add_book(1, 2, 2).await;
        store.add_member(1, 5, true).await;
        let lifecycle = LoanLifecycle::new(Arc::new(FailingStore(store.clone())));

        let err = lifecycle.borrow(&new_loan(1, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(store.loan_count().await, 0);
        assert_eq!(available(&store, 1).await, 2);

        // The ledger lock was released with the dropped unit
        LoanLifecycle::new(Arc::new(store.clone()))
            .borrow(&new_loan(1, 1))
            .await
            .unwrap();
        assert_eq!(available(&store, 1).await, 1);
    }
}
