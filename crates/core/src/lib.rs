//! Domain logic shared by the repository and HTTP layers.
//!
//! Nothing in this crate touches the database or the network.

pub mod audit;
pub mod contract;
pub mod error;
pub mod listing;
pub mod permissions;
pub mod rate_limit;
pub mod types;
pub mod validation;
