//! Per-client request limiting for everything under `/api`.
//!
//! Requests carrying a valid bearer token are counted against the token's
//! subject; everything else is counted against the client address.
//! `X-Forwarded-For` is only consulted when `trust_forwarded_for` is set.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use clientdesk_core::error::CoreError;
use clientdesk_core::rate_limit::{unix_now, RateLimitDecision};

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::middleware::auth::bearer_token;
use crate::state::AppState;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Axum middleware (via `from_fn_with_state`) that consults the limiter
/// before any extractor or handler runs.
pub async fn rate_limit(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = bearer_token(request.headers())
        .and_then(|token| validate_token(token, &state.config.jwt).ok());

    let key = match &claims {
        Some(claims) => format!("user:{}", claims.sub),
        None => {
            let peer = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr);
            client_address_key(request.headers(), peer, state.config.trust_forwarded_for)
        }
    };

    if let Some(claims) = claims {
        request.extensions_mut().insert(claims);
    }

    let decision = state.rate_limiter.check(&key);

    let mut response = if decision.success {
        next.run(request).await
    } else {
        tracing::warn!(key = %key, limit = decision.limit, "Rate limit exceeded");
        AppError::Core(CoreError::RateLimited {
            key,
            reset_secs: decision.retry_after(unix_now()),
        })
        .into_response()
    };

    apply_headers(response.headers_mut(), &decision);
    response
}

/// `ip:<addr>` from the first `X-Forwarded-For` hop when the proxy is
/// trusted, else the peer address, else `anonymous`.
pub fn client_address_key(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .filter(|_| trust_forwarded_for)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());

    match (forwarded, peer) {
        (Some(hop), _) => format!("ip:{hop}"),
        (None, Some(addr)) => format!("ip:{}", addr.ip()),
        (None, None) => "anonymous".to_string(),
    }
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(decision.limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(decision.reset));
}
