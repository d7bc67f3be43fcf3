//! Borrow record model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Borrow record from database.
///
/// A record with `returned_at = None` is an open loan. `borrowed_at` is set
/// at creation and never changes; `returned_at` is written exactly once, on
/// return or by the decommission "return" repair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BorrowRecord {
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl BorrowRecord {
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// A user's loan projected for display: the counterpart is the book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserLoanView {
    pub id: String,
    pub title: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

/// A book's loan projected for display: the counterpart is the user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookLoanView {
    pub id: String,
    pub user_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

/// Repair strategy for removing an entity that still has open loans.
///
/// `Return` closes each open loan as if it had been returned (restocking the
/// counterpart book when a user is removed); `Remove` discards the records
/// outright with no copy-count side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairMode {
    Return,
    Remove,
}

impl RepairMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairMode::Return => "return",
            RepairMode::Remove => "remove",
        }
    }
}

impl std::fmt::Display for RepairMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RepairMode {
    type Err = AppError;

    /// Case-insensitive; anything but "return"/"remove" is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "return" => Ok(RepairMode::Return),
            "remove" => Ok(RepairMode::Remove),
            _ => Err(AppError::InvalidRepairMode(s.to_string())),
        }
    }
}
