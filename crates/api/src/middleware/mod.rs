pub mod auth;
pub mod permission;
pub mod rate_limit;
