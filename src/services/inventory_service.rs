use chrono::Utc;
use std::time::Duration;
use crate::models::errors::AppError;
use crate::models::inventory::{
    CreateInventoryRequest, DispatchRequest, Inventory, InventoryView, UpdateInventoryRequest,
};
use crate::services::cache_manager::{CacheManager, CacheStats, INVENTORY_LIST_KEY};
use crate::services::document_store::{Collection, CollectionStats};

/// Inventory lifecycle on top of the store, with a read-through list cache
pub struct InventoryService {
    inventories: Collection<Inventory>,
    cache: CacheManager<String, String>,
}

impl InventoryService {
    pub fn new(inventories: Collection<Inventory>, cache_ttl: Duration) -> Self {
        Self {
            inventories,
            cache: CacheManager::with_ttl(cache_ttl),
        }
    }

    pub async fn create(&self, request: CreateInventoryRequest) -> Result<Inventory, AppError> {
        let inventory = request.into_inventory().map_err(AppError::validation_failed)?;
        let inventory = self.inventories.insert(inventory).await?;

        self.invalidate_list().await;
        tracing::info!("Created inventory {} ({})", inventory.id, inventory.name);
        Ok(inventory)
    }

    /// All records, served from the cache while it is fresh
    pub async fn list(&self) -> Result<Vec<InventoryView>, AppError> {
        let key = INVENTORY_LIST_KEY.to_string();

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("Inventory list served from cache");
            return serde_json::from_str(&cached).map_err(|e| {
                AppError::internal_error(format!("Corrupt inventory cache entry: {}", e))
            });
        }

        let views: Vec<InventoryView> = self
            .inventories
            .find_all()
            .await
            .into_iter()
            .map(InventoryView::from)
            .collect();

        let serialized = serde_json::to_string(&views)
            .map_err(|e| AppError::internal_error(format!("Failed to serialize inventories: {}", e)))?;
        self.cache.insert(key, serialized).await;

        tracing::debug!("Inventory list loaded from store ({} records)", views.len());
        Ok(views)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Inventory, AppError> {
        self.inventories
            .find_by_id(id)
            .await
            .ok_or_else(|| AppError::not_found("Inventory", id))
    }

    /// Applies the fields present in `request`
    pub async fn update(
        &self,
        id: &str,
        request: UpdateInventoryRequest,
    ) -> Result<Inventory, AppError> {
        let current = self.get_by_id(id).await?;
        let changes = request.into_changes().map_err(AppError::validation_failed)?;

        if changes.is_empty() {
            return Ok(current);
        }

        let updated = current
            .with_changes(&changes)
            .map_err(AppError::validation_failed)?;
        self.save(updated).await
    }

    pub async fn delete(&self, id: &str) -> Result<Inventory, AppError> {
        let removed = self
            .inventories
            .delete(id)
            .await?
            .ok_or_else(|| AppError::not_found("Inventory", id))?;

        self.invalidate_list().await;
        tracing::info!("Deleted inventory {}", id);
        Ok(removed)
    }

    /// Marks the scanned record as dispatched
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<Inventory, AppError> {
        let id = request
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::validation_failed("Invalid QR code: missing record id"))?;

        let current = self.get_by_id(&id).await?;
        let changes = request
            .into_changes(&current, Utc::now())
            .map_err(AppError::validation_failed)?;
        let updated = current
            .with_changes(&changes)
            .map_err(AppError::validation_failed)?;

        let updated = self.save(updated).await?;
        tracing::info!(
            "Dispatched {} of inventory {}",
            updated.quantity.dispatched_quantity,
            updated.id
        );
        Ok(updated)
    }

    /// JSON text to encode into the record's QR code
    pub async fn qr_payload(&self, id: &str) -> Result<String, AppError> {
        let inventory = self.get_by_id(id).await?;
        inventory
            .qr_payload()
            .map_err(|e| AppError::internal_error(format!("Failed to encode QR payload: {}", e)))
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.get_stats().await
    }

    pub async fn store_stats(&self) -> CollectionStats {
        self.inventories.stats().await
    }

    pub async fn cleanup_cache(&self) -> usize {
        self.cache.cleanup_expired().await
    }

    async fn save(&self, inventory: Inventory) -> Result<Inventory, AppError> {
        let id = inventory.id.clone();
        let saved = self
            .inventories
            .replace(inventory)
            .await?
            .ok_or_else(|| AppError::not_found("Inventory", id))?;

        self.invalidate_list().await;
        Ok(saved)
    }

    async fn invalidate_list(&self) {
        self.cache.invalidate(&INVENTORY_LIST_KEY.to_string()).await;
    }
}
