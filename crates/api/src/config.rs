use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins (default: `http://localhost:5173`).
    pub cors_origins: Vec<String>,
    /// Request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Requests allowed per key per window (default: `100`).
    pub rate_limit_max_requests: u32,
    /// Rate-limit window length in seconds (default: `60`).
    pub rate_limit_window_secs: u64,
    /// Distinct keys the limiter tracks at once (default: `10000`).
    pub rate_limit_max_keys: usize,
    /// Key anonymous callers by the first `X-Forwarded-For` hop instead of
    /// the socket peer (default: `false`). Only enable behind a proxy that
    /// overwrites the header.
    pub trust_forwarded_for: bool,
    /// JWT signing configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `RATE_LIMIT_MAX_REQUESTS` | `100`                   |
    /// | `RATE_LIMIT_WINDOW_SECS`  | `60`                    |
    /// | `RATE_LIMIT_MAX_KEYS`     | `10000`                 |
    /// | `TRUST_FORWARDED_FOR`     | `false`                 |
    ///
    /// `CORS_ORIGINS` is a comma-separated list. See [`JwtConfig::from_env`]
    /// for the token variables.
    ///
    /// # Panics
    ///
    /// Panics if a numeric variable does not parse, or if `JWT_SECRET` is
    /// missing.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let rate_limit_max_requests: u32 = std::env::var("RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("RATE_LIMIT_MAX_REQUESTS must be a valid u32");

        let rate_limit_window_secs: u64 = std::env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("RATE_LIMIT_WINDOW_SECS must be a valid u64");

        let rate_limit_max_keys: usize = std::env::var("RATE_LIMIT_MAX_KEYS")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("RATE_LIMIT_MAX_KEYS must be a valid usize");

        let trust_forwarded_for: bool = std::env::var("TRUST_FORWARDED_FOR")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("TRUST_FORWARDED_FOR must be 'true' or 'false'");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            rate_limit_max_requests,
            rate_limit_window_secs,
            rate_limit_max_keys,
            trust_forwarded_for,
            jwt: JwtConfig::from_env(),
        }
    }
}
