use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod bookmarks;
pub mod chat;
pub mod doc;
pub mod form;
pub mod health;
pub mod items;
pub mod params;
pub mod profile;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/items", items::router())
        .nest("/bookmarks", bookmarks::router())
        .nest("/profile", profile::router())
}
