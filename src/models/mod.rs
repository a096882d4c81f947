//! Data models for the library service

pub mod book;
pub mod catalog;
pub mod enums;
pub mod fine;
pub mod loan;
pub mod member;
pub mod pagination;

// Re-export commonly used types
pub use book::{Book, BookDetail, BookSummary};
pub use catalog::{Author, Category, Publisher};
pub use enums::{BookCondition, DisplayStatus, Gender, LoanStatus, MembershipType, PaymentStatus};
pub use fine::Fine;
pub use loan::{LoanListing, LoanTransaction, NewLoan};
pub use member::{Member, MemberDetail, MemberSummary};
pub use pagination::{Page, PageRequest, Pagination};
