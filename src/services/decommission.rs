//! Decommission protocol: removing books and users that may still have
//! open loans.
//!
//! Removal with open loans requires `force` plus an explicit repair
//! strategy. The repair runs, the records referencing the entity are
//! discarded (the cascade is an explicit step, not a storage-engine side
//! effect), and the entity row is deleted, all in one transaction.

use chrono::Utc;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::loan::RepairMode,
    repository::{
        books::BooksRepository, loans::LoansRepository, users::UsersRepository, Repository,
    },
};

#[derive(Clone)]
pub struct DecommissionService {
    repository: Repository,
    config: LendingConfig,
}

impl DecommissionService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Remove a book.
    ///
    /// With open loans and `repair = Return` the loans are closed first, so
    /// borrower-side counts stay correct; the book's own copy counts need no
    /// adjustment since the row is deleted next. With `Remove` the records
    /// are discarded as-is.
    pub async fn remove_book(
        &self,
        barcode: &str,
        force: bool,
        repair: Option<RepairMode>,
    ) -> AppResult<()> {
        super::with_retry(self.config.max_transaction_retries, || {
            self.try_remove_book(barcode, force, repair)
        })
        .await
    }

    async fn try_remove_book(
        &self,
        barcode: &str,
        force: bool,
        repair: Option<RepairMode>,
    ) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        let book = BooksRepository::find_by_barcode_tx(&mut tx, barcode)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Book with barcode {} not found", barcode))
            })?;

        let open = LoansRepository::count_open_for_book_tx(&mut tx, &book.id).await?;

        if open > 0 {
            match Self::required_repair(force, repair, open)? {
                RepairMode::Return => {
                    LoansRepository::close_open_for_book_tx(&mut tx, &book.id, Utc::now())
                        .await?;
                }
                RepairMode::Remove => {}
            }
        }

        let discarded = LoansRepository::delete_for_book_tx(&mut tx, &book.id).await?;
        BooksRepository::delete_tx(&mut tx, &book.id).await?;

        tx.commit().await?;

        tracing::info!(
            barcode = %book.barcode,
            open_loans = open,
            discarded_records = discarded,
            "book removed"
        );

        Ok(())
    }

    /// Remove a user.
    ///
    /// With open loans and `repair = Return` each loan is closed as if
    /// individually returned, restocking the counterpart book. With
    /// `Remove` the records are discarded with no copy-count side effects.
    pub async fn remove_user(
        &self,
        user_id: &str,
        force: bool,
        repair: Option<RepairMode>,
    ) -> AppResult<()> {
        super::with_retry(self.config.max_transaction_retries, || {
            self.try_remove_user(user_id, force, repair)
        })
        .await
    }

    async fn try_remove_user(
        &self,
        user_id: &str,
        force: bool,
        repair: Option<RepairMode>,
    ) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        let user = UsersRepository::find_by_id_tx(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        let open_loans = LoansRepository::list_open_for_user_tx(&mut tx, &user.id).await?;

        if !open_loans.is_empty() {
            match Self::required_repair(force, repair, open_loans.len() as i64)? {
                RepairMode::Return => {
                    let returned_at = Utc::now();
                    for loan in &open_loans {
                        LoansRepository::close_tx(&mut tx, &loan.id, returned_at).await?;
                        if !BooksRepository::increment_available_tx(&mut tx, &loan.book_id)
                            .await?
                        {
                            tracing::warn!(
                                book_id = %loan.book_id,
                                "all copies already on the shelf, skipping restock"
                            );
                        }
                    }
                }
                RepairMode::Remove => {}
            }
        }

        let discarded = LoansRepository::delete_for_user_tx(&mut tx, &user.id).await?;
        UsersRepository::delete_tx(&mut tx, &user.id).await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user.id,
            open_loans = open_loans.len(),
            discarded_records = discarded,
            "user removed"
        );

        Ok(())
    }

    /// Gate for removing an entity with open loans: `force` is required, and
    /// forcing requires an explicit repair mode.
    fn required_repair(
        force: bool,
        repair: Option<RepairMode>,
        open: i64,
    ) -> AppResult<RepairMode> {
        if !force {
            return Err(AppError::HasActiveLoans { count: open });
        }
        repair.ok_or(AppError::RepairModeRequired)
    }
}
