use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap,
    },
    middleware::Next,
    response::Response,
};
use cookie::Cookie;
use crate::models::errors::AppError;
use crate::models::user::User;
use crate::AppState;

/// Name of the cookie carrying the access token
pub const TOKEN_COOKIE: &str = "jwt";

/// The user resolved by [`protect`], available to handlers as an extension
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Pulls the access token from `Authorization: Bearer` or, failing that, the `jwt` cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer"))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string);

    from_header.or_else(|| token_from_cookies(headers))
}

fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Requires a valid token whose user still exists
pub async fn protect(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers()).ok_or_else(|| {
        AppError::unauthorized("You are not logged in! Please log in to get access.")
    })?;

    let user = state.auth.authenticate(&token).await?;
    tracing::debug!("Authenticated user {} for {}", user.id, request.uri().path());

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
