use super::balances::OwnerKind;
use super::gacha_pool_entries::ItemType;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// "Owner unlocked item" relation. Unique over (owner_kind, owner_id,
/// item_type, item_key); granting an owned item is a no-op.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner_kind: OwnerKind,
    pub owner_id: i64,
    pub item_type: ItemType,
    pub item_key: String,
    pub granted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
