//! Shared test fixtures

use alexandria_core::{
    config::{AppConfig, DatabaseConfig},
    models::{Book, CreateBook, CreateUser, User},
    repository::Repository,
    services::Services,
};

/// Fresh service stack over a private in-memory database
pub async fn setup() -> Services {
    let config = AppConfig::default();
    alexandria_core::init_tracing(&config.logging);

    let database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };

    let repository = Repository::connect(&database)
        .await
        .expect("failed to open in-memory database");

    Services::new(repository, config.lending)
}

pub async fn add_book(services: &Services, title: &str, barcode: &str, total_copies: i64) -> Book {
    services
        .books
        .add_book(CreateBook {
            title: title.to_string(),
            barcode: barcode.to_string(),
            total_copies,
        })
        .await
        .expect("failed to add book")
}

pub async fn add_user(services: &Services, name: &str) -> User {
    services
        .users
        .add_user(CreateUser {
            name: name.to_string(),
        })
        .await
        .expect("failed to add user")
}
