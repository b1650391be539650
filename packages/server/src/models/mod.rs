pub mod admin;
pub mod album;
pub mod auth;
pub mod event;
pub mod post;
pub mod shared;
