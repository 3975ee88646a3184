use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use cookie::{Cookie, SameSite};
use serde::Serialize;
use serde_json::json;
use crate::middleware::auth::{extract_token, TOKEN_COOKIE};
use crate::models::errors::AppError;
use crate::utils::json::AppJson;
use crate::models::user::{LoginRequest, RegisterRequest};
use crate::AppState;

/// Body returned by login and token verification
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub token: String,
    pub user_id: String,
}

/// Register a new user
pub async fn register(
    State(app_state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = app_state.auth.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "User registered successfully",
            "user": profile
        })),
    ))
}

/// Log in and receive an access token, also set as an HttpOnly cookie
pub async fn login(
    State(app_state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let issued = app_state.auth.login(request).await?;

    let cookie = Cookie::build((TOKEN_COOKIE, issued.token.clone()))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(
            app_state.auth.token_lifetime_seconds(),
        ))
        .build();

    Ok((
        [(SET_COOKIE, cookie.to_string())],
        Json(TokenResponse {
            status: "success",
            message: "Logged in successfully!",
            token: issued.token,
            user_id: issued.user_id,
        }),
    ))
}

/// Check a token from the Authorization header or the jwt cookie
pub async fn verify(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    let token = extract_token(&headers).ok_or_else(|| AppError::unauthorized("No token provided"))?;
    let claims = app_state.auth.verify_token(&token)?;

    Ok(Json(TokenResponse {
        status: "success",
        message: "Token verified successfully!",
        token,
        user_id: claims.user_id,
    }))
}
