//! In-memory loan ledger.
//!
//! A unit holds the ledger lock from `begin` until it is committed or
//! dropped, and works on a private copy that replaces the shared state only
//! on commit. Used by the test suites in place of PostgreSQL.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::ledger::{ActiveLoan, LoanStore, LoanTx};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookStock,
        enums::LoanStatus,
        loan::NewLoan,
        member::MemberStanding,
        pagination::{Page, PageRequest},
    },
};

/// A stored loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLoan {
    pub loan: NewLoan,
    pub status: LoanStatus,
    pub return_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    books: BTreeMap<i32, BookStock>,
    members: BTreeMap<i32, MemberStanding>,
    loans: BTreeMap<i32, MemoryLoan>,
    last_transaction_id: i32,
}

impl Ledger {
    fn active_loans(&self) -> impl Iterator<Item = (&i32, &MemoryLoan)> {
        self.loans
            .iter()
            .filter(|(_, l)| l.status == LoanStatus::Active)
    }
}

#[derive(Clone, Default)]
pub struct MemoryLoanStore {
    state: Arc<Mutex<Ledger>>,
}

impl MemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_book(&self, book_id: i32, total_copies: i32, available_copies: i32) {
        self.state.lock().await.books.insert(
            book_id,
            BookStock {
                book_id,
                total_copies,
                available_copies,
            },
        );
    }

    pub async fn add_member(&self, member_id: i32, max_books_allowed: i32, is_active: bool) {
        self.state.lock().await.members.insert(
            member_id,
            MemberStanding {
                member_id,
                is_active,
                max_books_allowed,
            },
        );
    }

    pub async fn book(&self, book_id: i32) -> Option<BookStock> {
        self.state.lock().await.books.get(&book_id).copied()
    }

    pub async fn member(&self, member_id: i32) -> Option<MemberStanding> {
        self.state.lock().await.members.get(&member_id).copied()
    }

    pub async fn loan(&self, transaction_id: i32) -> Option<MemoryLoan> {
        self.state.lock().await.loans.get(&transaction_id).cloned()
    }

    pub async fn loan_count(&self) -> usize {
        self.state.lock().await.loans.len()
    }

    /// Loans newest first, optionally for one member, in the requested window
    pub async fn loan_page(
        &self,
        member_id: Option<i32>,
        request: PageRequest,
    ) -> Page<(i32, MemoryLoan)> {
        let state = self.state.lock().await;
        let mut loans: Vec<(i32, MemoryLoan)> = state
            .loans
            .iter()
            .filter(|(_, l)| member_id.map_or(true, |id| l.loan.member_id == id))
            .map(|(id, l)| (*id, l.clone()))
            .collect();
        loans.sort_by(|(a_id, a), (b_id, b)| {
            b.loan
                .loan_date
                .cmp(&a.loan.loan_date)
                .then(b_id.cmp(a_id))
        });
        Page::from_all(loans, request)
    }

    pub async fn active_loans_for_member(&self, member_id: i32) -> usize {
        self.state
            .lock()
            .await
            .active_loans()
            .filter(|(_, l)| l.loan.member_id == member_id)
            .count()
    }
}

#[async_trait]
impl LoanStore for MemoryLoanStore {
    async fn begin(&self) -> AppResult<Box<dyn LoanTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryLoanTx { guard, working }))
    }
}

pub struct MemoryLoanTx {
    guard: OwnedMutexGuard<Ledger>,
    working: Ledger,
}

#[async_trait]
impl LoanTx for MemoryLoanTx {
    async fn book_for_update(&mut self, book_id: i32) -> AppResult<Option<BookStock>> {
        Ok(self.working.books.get(&book_id).copied())
    }

    async fn member_for_update(&mut self, member_id: i32) -> AppResult<Option<MemberStanding>> {
        Ok(self.working.members.get(&member_id).copied())
    }

    async fn active_loan_for_update(
        &mut self,
        transaction_id: i32,
    ) -> AppResult<Option<ActiveLoan>> {
        Ok(self
            .working
            .loans
            .get(&transaction_id)
            .filter(|l| l.status == LoanStatus::Active)
            .map(|l| ActiveLoan {
                transaction_id,
                member_id: l.loan.member_id,
                book_id: l.loan.book_id,
            }))
    }

    async fn count_active_loans_for_member(&mut self, member_id: i32) -> AppResult<i64> {
        Ok(self
            .working
            .active_loans()
            .filter(|(_, l)| l.loan.member_id == member_id)
            .count() as i64)
    }

    async fn count_active_loans_for_book(&mut self, book_id: i32) -> AppResult<i64> {
        Ok(self
            .working
            .active_loans()
            .filter(|(_, l)| l.loan.book_id == book_id)
            .count() as i64)
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<i32> {
        if !self.working.books.contains_key(&loan.book_id) {
            return Err(AppError::BadRequest(
                "Data integrity error: book does not exist".to_string(),
            ));
        }
        if !self.working.members.contains_key(&loan.member_id) {
            return Err(AppError::BadRequest(
                "Data integrity error: member does not exist".to_string(),
            ));
        }

        self.working.last_transaction_id += 1;
        let id = self.working.last_transaction_id;
        self.working.loans.insert(
            id,
            MemoryLoan {
                loan: loan.clone(),
                status: LoanStatus::Active,
                return_date: None,
            },
        );
        Ok(id)
    }

    async fn adjust_available_copies(&mut self, book_id: i32, delta: i32) -> AppResult<bool> {
        let Some(stock) = self.working.books.get_mut(&book_id) else {
            return Ok(false);
        };
        let next = stock.available_copies + delta;
        if next < 0 || next > stock.total_copies {
            return Ok(false);
        }
        stock.available_copies = next;
        Ok(true)
    }

    async fn mark_returned(
        &mut self,
        transaction_id: i32,
        return_date: NaiveDate,
    ) -> AppResult<bool> {
        match self.working.loans.get_mut(&transaction_id) {
            Some(loan) if loan.status == LoanStatus::Active => {
                loan.status = LoanStatus::Returned;
                loan.return_date = Some(return_date);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn deactivate_member(&mut self, member_id: i32) -> AppResult<()> {
        if let Some(member) = self.working.members.get_mut(&member_id) {
            member.is_active = false;
        }
        Ok(())
    }

    async fn delete_book(&mut self, book_id: i32) -> AppResult<()> {
        self.working.books.remove(&book_id);
        self.working.loans.retain(|_, l| l.loan.book_id != book_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryLoanTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
