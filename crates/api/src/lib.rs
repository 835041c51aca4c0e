//! HTTP layer for the client management back office.
//!
//! Exposes the router builder so integration tests can drive the full
//! middleware stack without binding a socket.

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
