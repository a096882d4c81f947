//! Transactional seam between the loan lifecycle and its backing store.
//!
//! Every borrow, return and guarded deletion runs inside one [`LoanTx`].
//! A unit takes effect only through [`LoanTx::commit`]; dropping it without
//! committing discards every change made through it.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::FromRow;

use crate::{
    error::AppResult,
    models::{book::BookStock, member::MemberStanding, loan::NewLoan},
};

/// Identity of an active loan, read under lock before it is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct ActiveLoan {
    pub transaction_id: i32,
    pub member_id: i32,
    pub book_id: i32,
}

/// Opens loan units
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn LoanTx>>;
}

/// One all-or-nothing unit of loan bookkeeping.
///
/// The `*_for_update` reads lock the row they return until the unit ends.
#[async_trait]
pub trait LoanTx: Send {
    async fn book_for_update(&mut self, book_id: i32) -> AppResult<Option<BookStock>>;

    async fn member_for_update(&mut self, member_id: i32) -> AppResult<Option<MemberStanding>>;

    async fn active_loan_for_update(&mut self, transaction_id: i32)
        -> AppResult<Option<ActiveLoan>>;

    async fn count_active_loans_for_member(&mut self, member_id: i32) -> AppResult<i64>;

    async fn count_active_loans_for_book(&mut self, book_id: i32) -> AppResult<i64>;

    /// Insert an Active loan and return its transaction id
    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<i32>;

    /// Shift `available_copies` by `delta`. Returns `false` without touching
    /// the row when the result would leave `0..=total_copies`.
    async fn adjust_available_copies(&mut self, book_id: i32, delta: i32) -> AppResult<bool>;

    /// Close an Active loan. Returns `false` if it was not Active.
    async fn mark_returned(&mut self, transaction_id: i32, return_date: NaiveDate)
        -> AppResult<bool>;

    async fn deactivate_member(&mut self, member_id: i32) -> AppResult<()>;

    async fn delete_book(&mut self, book_id: i32) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
