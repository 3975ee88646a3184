use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use crate::AppState;

pub async fn health_check(State(app_state): State<AppState>) -> Json<Value> {
    let cache = app_state.inventory.cache_stats().await;
    let store = app_state.inventory.store_stats().await;

    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "inventory": {
            "records": store.documents,
            "cache": cache
        }
    }))
}
