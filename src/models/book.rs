//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Book model from database.
///
/// `available_copies` is derived state: after every committed mutation it
/// equals `total_copies` minus the number of open loans for the book.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    /// Unique shelf barcode, at most 13 characters
    pub barcode: String,
    pub total_copies: i64,
    pub available_copies: i64,
    pub created_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, max = 13, message = "Barcode must be 1 to 13 characters"))]
    pub barcode: String,
    #[validate(range(min = 1, message = "Total copies must be at least 1"))]
    pub total_copies: i64,
}
