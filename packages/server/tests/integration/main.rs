mod admin;
mod album;
mod auth;
mod common;
mod event;
mod files;
mod post;
