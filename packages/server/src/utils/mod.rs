pub mod conversation;
pub mod hash;
pub mod jwt;
pub mod ratings;
pub mod settings;
