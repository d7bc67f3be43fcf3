//! Error types for the Alexandria circulation core

use thiserror::Error;

/// Main application error type.
///
/// Every variant except [`AppError::Database`] is a recoverable domain error:
/// the caller gets a typed failure with a human-readable message and, where
/// relevant, the numeric detail (shortfall, loan count). `Database` wraps
/// storage failures and propagates unchanged.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Barcode '{0}' is already in use")]
    DuplicateBarcode(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "Total copies cannot be lower than the {open} currently borrowed copies \
         ({shortfall} more needed to cover open loans)"
    )]
    BelowBorrowedCount { open: i64, shortfall: i64 },

    #[error("Available copies would become negative ({missing} copies missing)")]
    NegativeAvailability { missing: i64 },

    #[error("Entity has {count} active loans. Use force=true with a repair mode to remove anyway")]
    HasActiveLoans { count: i64 },

    #[error("A repair mode ('return' or 'remove') is required when forcing removal")]
    RepairModeRequired,

    #[error("Invalid repair mode '{0}'. Use 'return' or 'remove'")]
    InvalidRepairMode(String),

    #[error("User already has the maximum number of borrowed books ({current}/{limit})")]
    UserLoanLimitReached { current: i64, limit: i64 },

    #[error("No available copies of this book")]
    NoCopiesAvailable,

    #[error("Loan not found: {0}")]
    LoanNotFound(String),

    #[error("Operation aborted after repeated transaction conflicts")]
    ConcurrencyConflict,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Whether the underlying storage reported a lock/busy conflict.
    ///
    /// SQLite surfaces writer collisions as `SQLITE_BUSY`/`SQLITE_LOCKED`;
    /// the coordinator retries these before giving up with
    /// [`AppError::ConcurrencyConflict`].
    pub fn is_busy(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db)) => {
                matches!(db.code().as_deref(), Some("5") | Some("6"))
                    || db.message().contains("database is locked")
                    || db.message().contains("database table is locked")
            }
            _ => false,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::InvalidArgument(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
