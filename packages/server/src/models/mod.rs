pub mod admin;
pub mod auth;
pub mod conversation;
pub mod rating;
pub mod settings;
pub mod shared;
