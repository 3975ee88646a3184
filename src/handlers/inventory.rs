use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::{json, Value};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::errors::AppError;
use crate::utils::json::AppJson;
use crate::models::inventory::{
    CreateInventoryRequest, DispatchRequest, InventoryView, UpdateInventoryRequest,
};
use crate::AppState;

/// List all inventory records
pub async fn list_inventories(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<InventoryView>>, AppError> {
    Ok(Json(app_state.inventory.list().await?))
}

/// Create a record from `name`, `date` and `quantity`
pub async fn create_inventory(
    State(app_state): State<AppState>,
    AppJson(request): AppJson<CreateInventoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let inventory = app_state.inventory.create(request).await?;
    Ok((StatusCode::CREATED, Json(InventoryView::from(inventory))))
}

pub async fn get_inventory(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InventoryView>, AppError> {
    let inventory = app_state.inventory.get_by_id(&id).await?;
    Ok(Json(inventory.into()))
}

pub async fn update_inventory(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateInventoryRequest>,
) -> Result<Json<InventoryView>, AppError> {
    let inventory = app_state.inventory.update(&id, request).await?;
    Ok(Json(inventory.into()))
}

/// Delete a record. Mounted behind `protect`.
pub async fn delete_inventory(
    State(app_state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    app_state.inventory.delete(&id).await?;
    tracing::info!("Inventory {} deleted by user {}", id, user.id);

    Ok(Json(json!({
        "message": "Inventory deleted",
        "_id": id
    })))
}

/// Mark the record in a scanned QR payload as dispatched
pub async fn scan_inventory(
    State(app_state): State<AppState>,
    AppJson(request): AppJson<DispatchRequest>,
) -> Result<Json<InventoryView>, AppError> {
    let inventory = app_state.inventory.dispatch(request).await?;
    Ok(Json(inventory.into()))
}

/// Text to render into the record's QR code
pub async fn inventory_qr_payload(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let payload = app_state.inventory.qr_payload(&id).await?;

    Ok(Json(json!({
        "_id": id,
        "payload": payload
    })))
}
