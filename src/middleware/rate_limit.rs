use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use crate::models::errors::AppError;
use crate::services::rate_limiter::identifier_from_ip;
use crate::AppState;

/// Bucket shared by requests that arrive without peer information
const UNKNOWN_CLIENT: &str = "unknown";

/// Rejects clients that exceed the configured request budget with 429
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identifier = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| identifier_from_ip(addr.ip()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    if let Err(e) = state.rate_limiter.check_rate_limit(&identifier).await {
        tracing::warn!("Rate limit exceeded for {}", identifier);
        return Err(e);
    }

    Ok(next.run(request).await)
}
