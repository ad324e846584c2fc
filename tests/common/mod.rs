#![allow(dead_code)]

use std::path::Path;

use chrono::{Duration, Utc};
use mulebay::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{items, users},
    middleware::auth::AuthUser,
    state::AppState,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use uuid::Uuid;

pub const SECRET: &str = "test-secret";

pub fn test_config(upload_dir: &Path) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        host: "127.0.0.1".into(),
        port: 0,
        db_max_connections: 1,
        jwt_secret: SECRET.into(),
        jwt_ttl_hours: 1,
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 64 * 1024,
        allowed_email_domain: "colby.edu".into(),
        chat_room_capacity: 8,
        google: None,
    }
}

pub fn mock_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

pub fn state_with(orm: DatabaseConnection, upload_dir: &Path) -> AppState {
    AppState::new(orm, test_config(upload_dir))
}

pub fn auth_user(user_id: Uuid) -> AuthUser {
    AuthUser {
        user_id,
        token_id: Uuid::new_v4(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

pub fn user_model(id: Uuid, email: &str) -> users::Model {
    users::Model {
        id,
        email: email.into(),
        password_hash: "unused".into(),
        first_name: "Test".into(),
        last_name: "User".into(),
        profile_image: None,
        profile_description: None,
        bookmark_items: serde_json::json!([]),
        selling_items: serde_json::json!([]),
        created_at: Utc::now().fixed_offset(),
    }
}

pub fn item_model(id: Uuid, seller_id: Uuid) -> items::Model {
    items::Model {
        id,
        seller_id,
        name: "Desk Lamp".into(),
        description: Some("Warm light".into()),
        item_photos: "/uploads/item_placeholder.svg".into(),
        price_cents: 1500,
        condition: Some("Good".into()),
        payment_options: serde_json::json!(["Cash"]),
        live_on_market: true,
        created_at: Utc::now().fixed_offset(),
    }
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

/// State backed by a real Postgres when `TEST_DATABASE_URL` or `DATABASE_URL` is set.
pub async fn postgres_state(uploads: &Path) -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url, 10).await?;
    let orm = create_orm_conn(pool);
    run_migrations(&orm).await?;

    let mut config = test_config(uploads);
    config.database_url = database_url;
    config.max_upload_bytes = 1024 * 1024;
    Ok(Some(AppState::new(orm, config)))
}
