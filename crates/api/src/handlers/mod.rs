pub mod auth;
pub mod clients;
pub mod contracts;
pub mod industries;
pub mod kpis;
pub mod roles;
pub mod service_assignments;
pub mod users;
