use axum::{response::Json, Extension};
use serde_json::{json, Value};
use crate::middleware::auth::AuthenticatedUser;

/// Profile of the logged-in user
pub async fn get_me(Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "user": user.profile()
    }))
}
