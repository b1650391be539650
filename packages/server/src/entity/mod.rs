pub mod account;
pub mod event;
pub mod post;
pub mod user_profile;
