use std::sync::Arc;

use clientdesk_core::rate_limit::RateLimiter;

use crate::audit::AuditSink;
use crate::config::ServerConfig;

/// Shared application state available to all handlers via axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: clientdesk_db::DbPool,
    /// Server configuration (shared, immutable).
    pub config: Arc<ServerConfig>,
    /// Per-key request limiter consulted by the `/api` middleware.
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Fire-and-forget audit log writer.
    pub audit: AuditSink,
}

impl AppState {
    pub fn new(
        pool: clientdesk_db::DbPool,
        config: ServerConfig,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            audit: AuditSink::new(pool.clone()),
            pool,
            config: Arc::new(config),
            rate_limiter,
        }
    }
}
