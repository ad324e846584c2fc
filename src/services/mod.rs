pub mod auth_service;
pub mod bookmark_service;
pub mod chat_service;
pub mod item_service;
pub mod profile_service;
