//! Medicine inventory.
//!
//! Stock changes are plain overwrites: the last write wins and nothing is accumulated.

use crate::error::{FrontDeskError, FrontDeskResult};
use crate::id::RecordId;
use crate::models::{InventoryItem, NewInventoryItem};
use crate::store::Store;
use chrono::Utc;
use frontdesk_types::StockLevel;
use std::sync::Arc;

/// Service for the inventory table.
#[derive(Debug)]
pub struct InventoryService<S> {
    store: Arc<S>,
}

impl<S> Clone for InventoryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> InventoryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn add_item(&self, item: NewInventoryItem) -> FrontDeskResult<InventoryItem> {
        let item = InventoryItem {
            id: RecordId::new(),
            name: item.name,
            stock: item.stock,
            expiry_date: item.expiry_date,
            unit: item.unit,
            updated_at: Utc::now(),
        };
        let item = self
            .store
            .insert(item)
            .map_err(FrontDeskError::InventoryCreate)?;

        tracing::info!(item_id = %item.id, name = %item.name, stock = %item.stock, "added inventory item");
        Ok(item)
    }

    /// Overwrites the stock of an item.
    ///
    /// # Errors
    ///
    /// Returns [`FrontDeskError::InventoryUpdate`] if the item does not exist.
    pub fn update_stock(&self, id: RecordId, stock: StockLevel) -> FrontDeskResult<InventoryItem> {
        let now = Utc::now();
        let item = self
            .store
            .update(id, |row: &mut InventoryItem| {
                row.stock = stock;
                row.updated_at = now;
                Ok(())
            })
            .map_err(FrontDeskError::InventoryUpdate)?;

        tracing::info!(item_id = %id, %stock, "stock updated");
        Ok(item)
    }

    /// Lists all items ordered by name.
    pub fn list(&self) -> FrontDeskResult<Vec<InventoryItem>> {
        self.store.select_all().map_err(FrontDeskError::Store)
    }
}
