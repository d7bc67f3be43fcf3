//! Membership ledger service

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{CreateUser, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a new user
    pub async fn add_user(&self, create: CreateUser) -> AppResult<User> {
        create.validate()?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: create.name,
            created_at: Utc::now(),
        };

        self.repository.users.insert(&user).await?;

        tracing::info!(id = %user.id, "user added");

        Ok(user)
    }

    /// Look up a user by id; an unknown id is absence, not an error
    pub async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        self.repository.users.find_by_id(id).await
    }

    /// List all users
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }
}
