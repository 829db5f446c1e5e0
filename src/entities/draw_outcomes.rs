use super::balances::OwnerKind;
use super::gacha_pool_entries::{ItemType, Rarity};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Result of one paid draw. Written exactly once, never mutated, retained
/// indefinitely. `reference` is the draw's idempotency key and is unique per
/// owner, which is what makes client retries return the original outcome.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "draw_outcomes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner_kind: OwnerKind,
    pub owner_id: i64,
    pub pool_id: String,
    pub pool_version: i32,
    pub cost_paid: i64,
    pub item_type: ItemType,
    pub item_key: String,
    pub rarity: Rarity,
    /// Ledger transaction that debited the cost.
    pub transaction_id: i64,
    pub reference: String,
    pub issued_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
