pub mod admin;
pub mod album;
pub mod auth;
pub mod event;
pub mod files;
pub mod post;
