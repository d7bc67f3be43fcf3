//! Decommission protocol: forced removal and repair strategies

mod common;

use alexandria_core::{models::RepairMode, AppError};
use common::{add_book, add_user, setup};

#[tokio::test]
async fn entity_without_open_loans_removes_without_force() {
    let services = setup().await;
    let user = add_user(&services, "Quiet Reader").await;
    let book = add_book(&services, "Unloved", "9782001", 1).await;

    // A closed loan is history, not an obstacle.
    services.lending.borrow(&user.id, &book.barcode).await.unwrap();
    services.lending.return_book(&user.id, &book.barcode).await.unwrap();

    services.decommission.remove_book(&book.barcode, false, None).await.unwrap();
    services.decommission.remove_user(&user.id, false, None).await.unwrap();

    assert!(services.books.list_books().await.unwrap().is_empty());
    assert!(services.users.get_user(&user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn open_loans_block_removal_without_force() {
    let services = setup().await;
    let user = add_user(&services, "Holder").await;
    let book = add_book(&services, "Held", "9782002", 1).await;
    services.lending.borrow(&user.id, &book.barcode).await.unwrap();

    let err = services.decommission.remove_book(&book.barcode, false, None).await.unwrap_err();
    assert!(matches!(err, AppError::HasActiveLoans { count: 1 }));

    let err = services.decommission.remove_user(&user.id, false, None).await.unwrap_err();
    assert!(matches!(err, AppError::HasActiveLoans { count: 1 }));

    // Neither entity was touched.
    assert!(services.users.get_user(&user.id).await.unwrap().is_some());
    services.books.get_book(&book.barcode).await.unwrap();
}

#[tokio::test]
async fn force_without_repair_mode_is_rejected() {
    let services = setup().await;
    let user = add_user(&services, "Holder").await;
    let book = add_book(&services, "Held", "9782003", 1).await;
    services.lending.borrow(&user.id, &book.barcode).await.unwrap();

    let err = services.decommission.remove_user(&user.id, true, None).await.unwrap_err();
    assert!(matches!(err, AppError::RepairModeRequired));

    let err = services.decommission.remove_book(&book.barcode, true, None).await.unwrap_err();
    assert!(matches!(err, AppError::RepairModeRequired));

    assert!(services.users.get_user(&user.id).await.unwrap().is_some());
}

#[tokio::test]
async fn removing_user_with_return_repair_restocks_the_books() {
    let services = setup().await;
    let user = add_user(&services, "Leaver").await;
    let book = add_book(&services, "Borrowed", "9782004", 2).await;
    services.lending.borrow(&user.id, &book.barcode).await.unwrap();

    services
        .decommission
        .remove_user(&user.id, true, Some(RepairMode::Return))
        .await
        .unwrap();

    assert!(services.users.get_user(&user.id).await.unwrap().is_none());

    // The copy came back, and no record still references the user.
    let book = services.books.get_book(&book.barcode).await.unwrap();
    assert_eq!(book.available_copies, 2);
    assert!(services.lending.list_book_loans(&book.barcode).await.unwrap().is_empty());
}

#[tokio::test]
async fn removing_user_with_remove_repair_discards_without_restock() {
    let services = setup().await;
    let user = add_user(&services, "Leaver").await;
    let book = add_book(&services, "Kept Out", "9782005", 2).await;
    services.lending.borrow(&user.id, &book.barcode).await.unwrap();

    services
        .decommission
        .remove_user(&user.id, true, Some(RepairMode::Remove))
        .await
        .unwrap();

    assert!(services.users.get_user(&user.id).await.unwrap().is_none());

    // Discarded records put nothing back on the shelf.
    let book = services.books.get_book(&book.barcode).await.unwrap();
    assert_eq!(book.available_copies, 1);
    assert!(services.lending.list_book_loans(&book.barcode).await.unwrap().is_empty());
}

#[tokio::test]
async fn removing_book_discards_its_records_either_way() {
    let services = setup().await;
    let user = add_user(&services, "Reader").await;

    let returned = add_book(&services, "Gets Returned", "9782006", 1).await;
    services.lending.borrow(&user.id, &returned.barcode).await.unwrap();
    services
        .decommission
        .remove_book(&returned.barcode, true, Some(RepairMode::Return))
        .await
        .unwrap();

    let discarded = add_book(&services, "Gets Discarded", "9782007", 1).await;
    services.lending.borrow(&user.id, &discarded.barcode).await.unwrap();
    services
        .decommission
        .remove_book(&discarded.barcode, true, Some(RepairMode::Remove))
        .await
        .unwrap();

    assert!(services.books.list_books().await.unwrap().is_empty());

    // With the records gone the user can fill the loan limit afresh.
    assert!(services.lending.list_user_loans(&user.id).await.unwrap().is_empty());
    for n in 0..3 {
        let book = add_book(&services, "Fresh", &format!("978300{}", n), 1).await;
        services.lending.borrow(&user.id, &book.barcode).await.unwrap();
    }
}

#[tokio::test]
async fn unknown_repair_mode_is_rejected_before_any_mutation() {
    let services = setup().await;
    let user = add_user(&services, "Holder").await;
    let book = add_book(&services, "Untouched", "9782008", 1).await;
    services.lending.borrow(&user.id, &book.barcode).await.unwrap();

    // The boundary parses the repair string; "bogus" never reaches the
    // protocol.
    let err = "bogus".parse::<RepairMode>().unwrap_err();
    assert!(matches!(err, AppError::InvalidRepairMode(_)));

    assert!(services.users.get_user(&user.id).await.unwrap().is_some());
    let book = services.books.get_book(&book.barcode).await.unwrap();
    assert_eq!(book.available_copies, 0);
    assert_eq!(services.lending.list_user_loans(&user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn removing_unknown_entities_fails_with_not_found() {
    let services = setup().await;

    let err = services.decommission.remove_book("missing", false, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = services.decommission.remove_user("missing", false, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
