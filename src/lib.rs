pub mod app;
pub mod audit;
pub mod chat;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod media;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
