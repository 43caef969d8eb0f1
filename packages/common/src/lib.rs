pub mod analytics;
pub mod anonymize;
pub mod csv;
pub mod query_status;
pub mod ranking;
pub mod role;
pub mod search;
pub mod settings;

pub use query_status::QueryStatus;
pub use role::Role;
