pub mod admin;
pub mod auth;
pub mod conversation;
pub mod query;
pub mod rating;
pub mod settings;
