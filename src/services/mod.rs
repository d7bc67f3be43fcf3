//! Business logic services

pub mod books;
pub mod decommission;
pub mod lending;
pub mod users;

use std::future::Future;
use std::time::Duration;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub users: users::UsersService,
    pub lending: lending::LendingService,
    pub decommission: decommission::DecommissionService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self {
            books: books::BooksService::new(repository.clone(), config.clone()),
            users: users::UsersService::new(repository.clone()),
            lending: lending::LendingService::new(repository.clone(), config.clone()),
            decommission: decommission::DecommissionService::new(repository, config),
        }
    }
}

/// Run a transactional operation, retrying when the storage layer reports a
/// lock conflict. Retries are bounded; exhaustion surfaces as
/// [`AppError::ConcurrencyConflict`].
pub(crate) async fn with_retry<F, Fut, T>(max_retries: u32, op: F) -> AppResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Err(err) if err.is_busy() => {
                if attempt >= max_retries {
                    tracing::warn!(retries = max_retries, "transaction conflict not resolved");
                    return Err(AppError::ConcurrencyConflict);
                }
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(20 * u64::from(attempt))).await;
            }
            other => return other,
        }
    }
}
