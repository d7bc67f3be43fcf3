//! Lending coordinator: borrow/return orchestration across the ledgers.
//!
//! Each (user, book) pair moves NotBorrowed -> Borrowed -> Returned; a new
//! borrow after a return starts a fresh cycle with a new record. Every
//! read-then-write path runs in a single transaction so concurrent requests
//! for the last copy cannot both succeed.

use chrono::Utc;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::loan::{BookLoanView, BorrowRecord, UserLoanView},
    repository::{
        books::BooksRepository, loans::LoansRepository, users::UsersRepository, Repository,
    },
};

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    config: LendingConfig,
}

impl LendingService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Borrow a book for a user.
    ///
    /// Fails when the user or book is unknown, the user is at the loan
    /// limit, the pair already has an open loan, or no copy is available.
    pub async fn borrow(&self, user_id: &str, barcode: &str) -> AppResult<BorrowRecord> {
        super::with_retry(self.config.max_transaction_retries, || {
            self.try_borrow(user_id, barcode)
        })
        .await
    }

    async fn try_borrow(&self, user_id: &str, barcode: &str) -> AppResult<BorrowRecord> {
        let mut tx = self.repository.pool.begin().await?;

        let user = UsersRepository::find_by_id_tx(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        let book = BooksRepository::find_by_barcode_tx(&mut tx, barcode)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Book with barcode {} not found", barcode))
            })?;

        let open = LoansRepository::count_open_for_user_tx(&mut tx, &user.id).await?;
        if open >= self.config.max_loans_per_user {
            return Err(AppError::UserLoanLimitReached {
                current: open,
                limit: self.config.max_loans_per_user,
            });
        }

        // One open loan per (user, book) pair.
        if LoansRepository::find_open_tx(&mut tx, &user.id, &book.id)
            .await?
            .is_some()
        {
            return Err(AppError::InvalidArgument(format!(
                "User already has '{}' on loan",
                book.title
            )));
        }

        if book.available_copies <= 0 {
            return Err(AppError::NoCopiesAvailable);
        }

        let record = LoansRepository::create_tx(&mut tx, &user.id, &book.id, Utc::now()).await?;

        // The guarded update re-checks availability at write time.
        if !BooksRepository::decrement_available_tx(&mut tx, &book.id).await? {
            return Err(AppError::NoCopiesAvailable);
        }

        tx.commit().await?;

        tracing::info!(user_id = %user.id, barcode = %book.barcode, "book borrowed");

        Ok(record)
    }

    /// Return a borrowed book.
    ///
    /// Closing the record and restocking the copy happen in one
    /// transaction; returning the same loan twice fails with `LoanNotFound`
    /// and leaves the availability untouched.
    pub async fn return_book(&self, user_id: &str, barcode: &str) -> AppResult<BorrowRecord> {
        super::with_retry(self.config.max_transaction_retries, || {
            self.try_return(user_id, barcode)
        })
        .await
    }

    async fn try_return(&self, user_id: &str, barcode: &str) -> AppResult<BorrowRecord> {
        let mut tx = self.repository.pool.begin().await?;

        let book = BooksRepository::find_by_barcode_tx(&mut tx, barcode)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Book with barcode {} not found", barcode))
            })?;

        let record = LoansRepository::find_open_tx(&mut tx, user_id, &book.id)
            .await?
            .ok_or_else(|| {
                AppError::LoanNotFound(format!(
                    "'{}' is not on loan to user {}",
                    book.title, user_id
                ))
            })?;

        let returned_at = Utc::now();

        if !LoansRepository::close_tx(&mut tx, &record.id, returned_at).await? {
            // The record was closed between lookup and update.
            return Err(AppError::LoanNotFound(format!(
                "Loan {} is already closed",
                record.id
            )));
        }

        if !BooksRepository::increment_available_tx(&mut tx, &book.id).await? {
            tracing::warn!(
                barcode = %book.barcode,
                "all copies already on the shelf, skipping restock"
            );
        }

        tx.commit().await?;

        tracing::info!(user_id, barcode = %book.barcode, "book returned");

        Ok(BorrowRecord {
            returned_at: Some(returned_at),
            ..record
        })
    }

    /// A user's loan history with each loan's book title
    pub async fn list_user_loans(&self, user_id: &str) -> AppResult<Vec<UserLoanView>> {
        let user = self
            .repository
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        self.repository.loans.list_views_for_user(&user.id).await
    }

    /// A book's loan history with each borrower's name
    pub async fn list_book_loans(&self, barcode: &str) -> AppResult<Vec<BookLoanView>> {
        let book = self.repository.books.get_by_barcode(barcode).await?;

        self.repository.loans.list_views_for_book(&book.id).await
    }
}
