use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::{ItemType, inventory_item_entity};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryItemResponse {
    pub item_type: ItemType,
    pub item_key: String,
    pub granted_at: DateTime<Utc>,
}

impl From<inventory_item_entity::Model> for InventoryItemResponse {
    fn from(m: inventory_item_entity::Model) -> Self {
        InventoryItemResponse {
            item_type: m.item_type,
            item_key: m.item_key,
            granted_at: m.granted_at.unwrap_or_else(Utc::now),
        }
    }
}
