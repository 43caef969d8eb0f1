pub mod app_setting;
pub mod conversation;
pub mod enabled_model;
pub mod profile;
pub mod query;
pub mod rating;
pub mod response;
pub mod system_prompt;
