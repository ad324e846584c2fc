pub mod auth;
pub mod bookmarks;
pub mod chat;
pub mod items;
pub mod profile;
