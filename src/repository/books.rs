//! Books repository for database operations

use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::{AppError, AppResult},
    models::book::Book,
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: SqlitePool,
}

impl BooksRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a book by barcode
    pub async fn get_by_barcode(&self, barcode: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE barcode = ?1")
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with barcode {} not found", barcode)))
    }

    /// List all books ordered by title
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY title, barcode")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Check if a barcode is already taken
    pub async fn barcode_exists(&self, barcode: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE barcode = ?1)")
                .bind(barcode)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Insert a new book. The UNIQUE constraint on barcode backs up the
    /// service-level duplicate check.
    pub async fn insert(&self, book: &Book) -> AppResult<()> {
        tracing::debug!(id = %book.id, barcode = %book.barcode, "inserting book");

        sqlx::query(
            r#"
            INSERT INTO books (id, title, barcode, total_copies, available_copies, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.barcode)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::DuplicateBarcode(book.barcode.clone())
            }
            other => AppError::from(other),
        })?;

        Ok(())
    }

    // Transactional primitives. These take the transaction's connection so
    // the caller decides the commit scope.

    /// Find a book by barcode inside a transaction
    pub async fn find_by_barcode_tx(
        conn: &mut SqliteConnection,
        barcode: &str,
    ) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE barcode = ?1")
            .bind(barcode)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(book)
    }

    /// Find a book by id inside a transaction
    pub async fn find_by_id_tx(conn: &mut SqliteConnection, id: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(book)
    }

    /// Overwrite a book's copy counts
    pub async fn set_copies_tx(
        conn: &mut SqliteConnection,
        id: &str,
        total_copies: i64,
        available_copies: i64,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE books SET total_copies = ?2, available_copies = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(total_copies)
        .bind(available_copies)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take one copy off the shelf. Guarded so availability can never go
    /// negative; returns false when no copy was left to take.
    pub async fn decrement_available_tx(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1
            WHERE id = ?1 AND available_copies > 0
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Put one copy back on the shelf. Guarded so availability can never
    /// exceed the total; returns false when the shelf was already full.
    pub async fn increment_available_tx(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1
            WHERE id = ?1 AND available_copies < total_copies
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a book row
    pub async fn delete_tx(conn: &mut SqliteConnection, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
