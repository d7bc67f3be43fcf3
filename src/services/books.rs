//! Inventory ledger service: books and their copy counts

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::book::{Book, CreateBook},
    repository::{books::BooksRepository, loans::LoansRepository, Repository},
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    config: LendingConfig,
}

impl BooksService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new book. Every copy starts on the shelf, so
    /// `available_copies` equals `total_copies`.
    pub async fn add_book(&self, create: CreateBook) -> AppResult<Book> {
        create.validate()?;

        if self.repository.books.barcode_exists(&create.barcode).await? {
            return Err(AppError::DuplicateBarcode(create.barcode));
        }

        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: create.title,
            barcode: create.barcode,
            total_copies: create.total_copies,
            available_copies: create.total_copies,
            created_at: Utc::now(),
        };

        // The UNIQUE constraint catches a barcode raced in between the
        // check above and this insert.
        self.repository.books.insert(&book).await?;

        tracing::info!(barcode = %book.barcode, copies = book.total_copies, "book added");

        Ok(book)
    }

    /// Get a book by barcode
    pub async fn get_book(&self, barcode: &str) -> AppResult<Book> {
        self.repository.books.get_by_barcode(barcode).await
    }

    /// List all books
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Change a book's total copy count.
    ///
    /// The available count shifts by the same delta, and the new total must
    /// still cover every open loan: shrinking below the number of borrowed
    /// copies is rejected with the shortfall reported.
    pub async fn set_total_copies(&self, barcode: &str, new_total: i64) -> AppResult<Book> {
        if new_total < 0 {
            return Err(AppError::InvalidArgument(format!(
                "Total copies cannot be negative (got {})",
                new_total
            )));
        }

        super::with_retry(self.config.max_transaction_retries, || {
            self.try_set_total_copies(barcode, new_total)
        })
        .await
    }

    async fn try_set_total_copies(&self, barcode: &str, new_total: i64) -> AppResult<Book> {
        let mut tx = self.repository.pool.begin().await?;

        let book = BooksRepository::find_by_barcode_tx(&mut tx, barcode)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Book with barcode {} not found", barcode))
            })?;

        let open = LoansRepository::count_open_for_book_tx(&mut tx, &book.id).await?;

        if new_total < open {
            return Err(AppError::BelowBorrowedCount {
                open,
                shortfall: open - new_total,
            });
        }

        let delta = new_total - book.total_copies;
        let new_available = book.available_copies + delta;

        // The open-loan check above should make this unreachable.
        if new_available < 0 {
            return Err(AppError::NegativeAvailability {
                missing: -new_available,
            });
        }

        BooksRepository::set_copies_tx(&mut tx, &book.id, new_total, new_available).await?;

        tx.commit().await?;

        tracing::info!(
            barcode = %book.barcode,
            total = new_total,
            available = new_available,
            "copy count updated"
        );

        Ok(Book {
            total_copies: new_total,
            available_copies: new_available,
            ..book
        })
    }
}
