mod common;

use mulebay::{
    dto::{
        auth::{LoginRequest, SignupRequest},
        bookmarks::BookmarkRequest,
        items::{ItemForm, ItemQuery},
    },
    entity::Users,
    error::AppError,
    middleware::auth::{AuthUser, decode_token},
    models::id_list,
    routes::params::Pagination,
    services::{auth_service, bookmark_service, chat_service, item_service},
    state::AppState,
};
use sea_orm::{ConnectionTrait, EntityTrait, Statement};

// Integration flow: two students sign up, one lists an item, the other bookmarks it and opens the chat.
#[tokio::test]
async fn list_bookmark_chat_and_delete_flow() -> anyhow::Result<()> {
    let uploads = tempfile::tempdir()?;
    // Skipped when no DB is configured in the environment.
    let Some(state) = common::postgres_state(uploads.path()).await? else {
        return Ok(());
    };
    truncate_all(&state).await?;

    let seller = signup_and_login(&state, "Seller@Colby.edu", "Sam", "Seller").await?;
    let buyer = signup_and_login(&state, "buyer@colby.edu", "Bea", "Buyer").await?;

    let duplicate = auth_service::signup(&state, signup(" SELLER@colby.edu", "Sam", "Seller")).await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(m)) if m == "Email is already taken"));

    let wrong_password = auth_service::login(
        &state,
        LoginRequest {
            email: "buyer@colby.edu".into(),
            password: "not the password".into(),
        },
    )
    .await;
    assert!(matches!(wrong_password, Err(AppError::BadRequest(m)) if m == "Invalid email or password"));

    // Emails are matched case-insensitively and stored lowercased.
    let shouted = auth_service::login(
        &state,
        LoginRequest {
            email: "  BUYER@COLBY.EDU ".into(),
            password: "password123".into(),
        },
    )
    .await?
    .data
    .expect("login data");
    assert_eq!(shouted.user.id, buyer.user_id);
    let seller_row = Users::find_by_id(seller.user_id)
        .one(state.db())
        .await?
        .expect("seller row");
    assert_eq!(seller_row.email, "seller@colby.edu");

    // Seller lists an item without a photo.
    let created = item_service::create_item(
        &state,
        &seller,
        ItemForm {
            name: Some("Desk Lamp".into()),
            description: Some("Warm light, barely used".into()),
            price: Some("12.50".into()),
            condition: Some("Like new".into()),
            payment_options: Some(vec!["Cash".into(), "Venmo".into()]),
            ..ItemForm::default()
        },
    )
    .await?
    .data
    .expect("created item");
    assert_eq!(created.price_cents, 1250);
    assert_eq!(created.price, 12.5);
    assert!(created.is_owner);
    assert!(created.live_on_market);
    assert_eq!(created.item_photos, "/uploads/item_placeholder.svg");

    let seller_row = Users::find_by_id(seller.user_id)
        .one(state.db())
        .await?
        .expect("seller row");
    assert_eq!(id_list(&seller_row.selling_items), vec![created.id]);

    // Buyer finds it by a case-insensitive search.
    let found = item_service::list_items(
        &state,
        &buyer,
        ItemQuery {
            q: Some("LAMP".into()),
            ..ItemQuery::default()
        },
    )
    .await?;
    assert_eq!(found.meta.as_ref().and_then(|m| m.total), Some(1));
    let listed = &found.data.as_ref().expect("items").items[0];
    assert_eq!(listed.id, created.id);
    assert!(!listed.is_owner);
    assert!(!listed.bookmarked);

    let none = item_service::list_items(
        &state,
        &buyer,
        ItemQuery {
            q: Some("bicycle".into()),
            ..ItemQuery::default()
        },
    )
    .await?;
    assert_eq!(none.meta.and_then(|m| m.total), Some(0));

    // Bookmarking twice keeps one entry.
    for _ in 0..2 {
        bookmark_service::set_bookmark(
            &state,
            &buyer,
            BookmarkRequest {
                item_id: created.id,
                bookmarked: true,
            },
        )
        .await?;
    }
    let bookmarks = bookmark_service::list_bookmarks(&state, &buyer, Pagination::default())
        .await?
        .data
        .expect("bookmarks");
    assert_eq!(bookmarks.items.len(), 1);
    let viewed = item_service::get_item(&state, &buyer, created.id)
        .await?
        .data
        .expect("item");
    assert!(viewed.bookmarked);

    // Only the seller may edit.
    let edit = ItemForm {
        price: Some("10".into()),
        live_on_market: Some(false),
        ..ItemForm::default()
    };
    let denied = item_service::update_item(&state, &buyer, created.id, ItemForm::default()).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    let updated = item_service::update_item(&state, &seller, created.id, edit)
        .await?
        .data
        .expect("updated item");
    assert_eq!(updated.price_cents, 1000);
    assert!(!updated.live_on_market);
    assert_eq!(updated.name, "Desk Lamp");

    // Opening the chat records the buyer once; the seller is never recorded.
    chat_service::open_session(&state, &buyer, created.id).await?;
    chat_service::open_session(&state, &buyer, created.id).await?;
    let session = chat_service::open_session(&state, &seller, created.id).await?;
    assert_eq!(session.display_name(), "Sam Seller");
    let chat = chat_service::get_chat(&state, &seller, created.id)
        .await?
        .data
        .expect("chat");
    assert_eq!(chat.buyer_ids, vec![buyer.user_id]);
    assert!(matches!(
        chat_service::get_chat(&state, &buyer, created.id).await,
        Err(AppError::Forbidden(_))
    ));

    // Deleting removes the item and the seller's listing reference.
    let deleted = item_service::delete_item(&state, &seller, created.id)
        .await?
        .data
        .expect("deleted");
    assert_eq!(deleted.status, "deleted");
    assert!(matches!(
        item_service::get_item(&state, &buyer, created.id).await,
        Err(AppError::Missing("Item"))
    ));
    let seller_row = Users::find_by_id(seller.user_id)
        .one(state.db())
        .await?
        .expect("seller row");
    assert!(id_list(&seller_row.selling_items).is_empty());
    let bookmarks = bookmark_service::list_bookmarks(&state, &buyer, Pagination::default())
        .await?
        .data
        .expect("bookmarks");
    assert!(bookmarks.items.is_empty());

    // Logout records the token as revoked.
    auth_service::logout(&state, &buyer).await?;
    let revoked = mulebay::entity::RevokedTokens::find_by_id(buyer.token_id)
        .one(state.db())
        .await?;
    assert!(revoked.is_some());

    Ok(())
}

fn signup(email: &str, first: &str, last: &str) -> SignupRequest {
    SignupRequest {
        email: email.into(),
        password: "password123".into(),
        first_name: first.into(),
        last_name: last.into(),
    }
}

async fn signup_and_login(
    state: &AppState,
    email: &str,
    first: &str,
    last: &str,
) -> anyhow::Result<AuthUser> {
    auth_service::signup(state, signup(email, first, last)).await?;
    let login = auth_service::login(
        state,
        LoginRequest {
            email: email.into(),
            password: "password123".into(),
        },
    )
    .await?
    .data
    .expect("login data");
    let token = login
        .token
        .strip_prefix("Bearer ")
        .expect("bearer prefix");
    Ok(decode_token(&state.config.jwt_secret, token)?)
}

async fn truncate_all(state: &AppState) -> anyhow::Result<()> {
    let backend = state.db().get_database_backend();
    state
        .db()
        .execute(Statement::from_string(
            backend,
            "TRUNCATE TABLE audit_logs, revoked_tokens, chats, items, users RESTART IDENTITY CASCADE;"
                .to_string(),
        ))
        .await?;
    Ok(())
}
