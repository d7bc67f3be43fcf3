//! Data models for the circulation core

pub mod book;
pub mod loan;
pub mod user;

pub use book::{Book, CreateBook};
pub use loan::{BookLoanView, BorrowRecord, RepairMode, UserLoanView};
pub use user::{CreateUser, User};
