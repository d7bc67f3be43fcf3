//! Inventory ledger: book registration and copy-count management

mod common;

use alexandria_core::{models::CreateBook, AppError};
use common::{add_book, add_user, setup};

#[tokio::test]
async fn add_book_starts_with_all_copies_available() {
    let services = setup().await;

    let book = add_book(&services, "Dune", "9781001", 4).await;
    assert_eq!(book.available_copies, 4);
    assert_eq!(book.total_copies, 4);

    let listed = services.books.list_books().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].barcode, "9781001");
}

#[tokio::test]
async fn add_book_rejects_duplicate_barcodes() {
    let services = setup().await;
    add_book(&services, "First", "9781002", 1).await;

    let err = services
        .books
        .add_book(CreateBook {
            title: "Second".to_string(),
            barcode: "9781002".to_string(),
            total_copies: 1,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DuplicateBarcode(ref code) if code == "9781002"));
}

#[tokio::test]
async fn add_book_validates_its_input() {
    let services = setup().await;

    let empty_title = CreateBook {
        title: String::new(),
        barcode: "9781003".to_string(),
        total_copies: 1,
    };
    assert!(matches!(
        services.books.add_book(empty_title).await.unwrap_err(),
        AppError::InvalidArgument(_)
    ));

    let oversized_barcode = CreateBook {
        title: "Valid".to_string(),
        barcode: "12345678901234".to_string(), // 14 chars
        total_copies: 1,
    };
    assert!(matches!(
        services.books.add_book(oversized_barcode).await.unwrap_err(),
        AppError::InvalidArgument(_)
    ));

    let zero_copies = CreateBook {
        title: "Valid".to_string(),
        barcode: "9781004".to_string(),
        total_copies: 0,
    };
    assert!(matches!(
        services.books.add_book(zero_copies).await.unwrap_err(),
        AppError::InvalidArgument(_)
    ));
}

#[tokio::test]
async fn set_total_copies_shifts_available_by_the_same_delta() {
    let services = setup().await;
    let user = add_user(&services, "Ada").await;
    let book = add_book(&services, "Adjustable", "9781005", 2).await;

    services.lending.borrow(&user.id, &book.barcode).await.unwrap();

    // 2 total / 1 available; growing to 5 leaves 4 on the shelf.
    let book = services.books.set_total_copies(&book.barcode, 5).await.unwrap();
    assert_eq!(book.total_copies, 5);
    assert_eq!(book.available_copies, 4);

    // Shrinking to exactly the open-loan count empties the shelf.
    let book = services.books.set_total_copies(&book.barcode, 1).await.unwrap();
    assert_eq!(book.total_copies, 1);
    assert_eq!(book.available_copies, 0);
}

#[tokio::test]
async fn set_total_copies_cannot_drop_below_open_loans() {
    let services = setup().await;
    let alice = add_user(&services, "Alice").await;
    let bob = add_user(&services, "Bob").await;
    let book = add_book(&services, "Popular", "9781006", 3).await;

    services.lending.borrow(&alice.id, &book.barcode).await.unwrap();
    services.lending.borrow(&bob.id, &book.barcode).await.unwrap();

    let err = services.books.set_total_copies(&book.barcode, 0).await.unwrap_err();
    assert!(matches!(err, AppError::BelowBorrowedCount { open: 2, shortfall: 2 }));
    assert!(err.to_string().contains('2'));

    // Nothing moved.
    let book = services.books.get_book(&book.barcode).await.unwrap();
    assert_eq!(book.total_copies, 3);
    assert_eq!(book.available_copies, 1);
}

#[tokio::test]
async fn set_total_copies_rejects_negative_and_unknown() {
    let services = setup().await;
    add_book(&services, "Known", "9781007", 1).await;

    let err = services.books.set_total_copies("9781007", -1).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    let err = services.books.set_total_copies("missing", 2).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn get_user_absence_is_not_an_error() {
    let services = setup().await;

    let missing = services.users.get_user("missing").await.unwrap();
    assert!(missing.is_none());

    let user = add_user(&services, "Present").await;
    let found = services.users.get_user(&user.id).await.unwrap();
    assert_eq!(found.unwrap().name, "Present");
}

#[tokio::test]
async fn users_allow_duplicate_names() {
    let services = setup().await;

    let first = add_user(&services, "Jane Doe").await;
    let second = add_user(&services, "Jane Doe").await;
    assert_ne!(first.id, second.id);

    let users = services.users.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
}
