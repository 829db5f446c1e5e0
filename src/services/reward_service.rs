use std::sync::Arc;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{ItemType, inventory_item_entity as inventory};
use crate::error::{AppError, AppResult};
use crate::models::{InventoryItemResponse, Owner};
use crate::services::pool_catalog::PoolCatalog;

/// Applies a won prize to the owner's unlocked-item inventory. The inventory
/// table is mutated only here.
#[derive(Clone)]
pub struct RewardService {
    pool: DatabaseConnection,
    catalog: Arc<PoolCatalog>,
}

impl RewardService {
    pub fn new(pool: DatabaseConnection, catalog: Arc<PoolCatalog>) -> Self {
        Self { pool, catalog }
    }

    /// Unlock an item. Returns `true` on first grant, `false` when the owner
    /// already has it; only unknown items fail. Runs on the caller's
    /// connection so the gacha engine can commit the grant atomically with
    /// its outcome record.
    pub async fn grant(
        &self,
        conn: &impl ConnectionTrait,
        owner: Owner,
        item_type: ItemType,
        item_key: &str,
    ) -> AppResult<bool> {
        if !self.catalog.is_known_item(item_type, item_key) {
            return Err(AppError::InvalidItem {
                item_type: item_type.to_string(),
                item_key: item_key.to_string(),
            });
        }

        // ON CONFLICT DO NOTHING makes the repeat grant a no-op instead of an
        // error; zero rows affected means the item was already owned
        let rows_affected = inventory::Entity::insert(inventory::ActiveModel {
            owner_kind: Set(owner.kind),
            owner_id: Set(owner.id),
            item_type: Set(item_type),
            item_key: Set(item_key.to_string()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                inventory::Column::OwnerKind,
                inventory::Column::OwnerId,
                inventory::Column::ItemType,
                inventory::Column::ItemKey,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

        Ok(rows_affected > 0)
    }

    /// Everything the owner has unlocked, newest first.
    pub async fn list_inventory(&self, owner: Owner) -> AppResult<Vec<InventoryItemResponse>> {
        let rows = inventory::Entity::find()
            .filter(inventory::Column::OwnerKind.eq(owner.kind))
            .filter(inventory::Column::OwnerId.eq(owner.id))
            .order_by_desc(inventory::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
