//! Loan register: borrow-record persistence primitives.
//!
//! These are pure read/write primitives with no invariant checking of their
//! own; validation is the lending coordinator's responsibility.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::loan::{BookLoanView, BorrowRecord, UserLoanView},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: SqlitePool,
}

impl LoansRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A user's loans (open and closed), newest last, with the book title
    pub async fn list_views_for_user(&self, user_id: &str) -> AppResult<Vec<UserLoanView>> {
        let views = sqlx::query_as::<_, UserLoanView>(
            r#"
            SELECT br.id, b.title, br.borrowed_at, br.returned_at
            FROM borrow_records br
            JOIN books b ON br.book_id = b.id
            WHERE br.user_id = ?1
            ORDER BY br.borrowed_at, br.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(views)
    }

    /// A book's loans (open and closed), newest last, with the borrower name
    pub async fn list_views_for_book(&self, book_id: &str) -> AppResult<Vec<BookLoanView>> {
        let views = sqlx::query_as::<_, BookLoanView>(
            r#"
            SELECT br.id, u.name AS user_name, br.borrowed_at, br.returned_at
            FROM borrow_records br
            JOIN users u ON br.user_id = u.id
            WHERE br.book_id = ?1
            ORDER BY br.borrowed_at, br.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(views)
    }

    // Transactional primitives

    /// The unique open record for a (user, book) pair, if any. Uniqueness is
    /// the coordinator's doing, not a schema constraint.
    pub async fn find_open_tx(
        conn: &mut SqliteConnection,
        user_id: &str,
        book_id: &str,
    ) -> AppResult<Option<BorrowRecord>> {
        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrow_records
            WHERE user_id = ?1 AND book_id = ?2 AND returned_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(record)
    }

    pub async fn count_open_for_user_tx(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records WHERE user_id = ?1 AND returned_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    pub async fn count_open_for_book_tx(
        conn: &mut SqliteConnection,
        book_id: &str,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records WHERE book_id = ?1 AND returned_at IS NULL",
        )
        .bind(book_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    /// All open records for a user, oldest first
    pub async fn list_open_for_user_tx(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrow_records
            WHERE user_id = ?1 AND returned_at IS NULL
            ORDER BY borrowed_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(records)
    }

    /// Create a new open record
    pub async fn create_tx(
        conn: &mut SqliteConnection,
        user_id: &str,
        book_id: &str,
        borrowed_at: DateTime<Utc>,
    ) -> AppResult<BorrowRecord> {
        let record = BorrowRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            book_id: book_id.to_string(),
            borrowed_at,
            returned_at: None,
        };

        tracing::debug!(id = %record.id, user_id, book_id, "creating borrow record");

        sqlx::query(
            r#"
            INSERT INTO borrow_records (id, user_id, book_id, borrowed_at, returned_at)
            VALUES (?1, ?2, ?3, ?4, NULL)
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.book_id)
        .bind(record.borrowed_at)
        .execute(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Close a record. Guarded on the record still being open, so a record
    /// is never closed twice; returns false when it already was.
    pub async fn close_tx(
        conn: &mut SqliteConnection,
        record_id: &str,
        returned_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE borrow_records SET returned_at = ?2 WHERE id = ?1 AND returned_at IS NULL",
        )
        .bind(record_id)
        .bind(returned_at)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Close every open record for a book
    pub async fn close_open_for_book_tx(
        conn: &mut SqliteConnection,
        book_id: &str,
        returned_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE borrow_records SET returned_at = ?2 WHERE book_id = ?1 AND returned_at IS NULL",
        )
        .bind(book_id)
        .bind(returned_at)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Discard every record (open and closed) referencing a user
    pub async fn delete_for_user_tx(conn: &mut SqliteConnection, user_id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM borrow_records WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Discard every record (open and closed) referencing a book
    pub async fn delete_for_book_tx(conn: &mut SqliteConnection, book_id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM borrow_records WHERE book_id = ?1")
            .bind(book_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
