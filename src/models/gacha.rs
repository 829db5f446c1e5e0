use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{ItemType, OwnerKind, Rarity, draw_outcome_entity};
use crate::services::pool_catalog::{PoolEntry, PrizePool};

use super::{CursorPage, TransactionResponse};

/// Pool entry as shown to clients. Weights are public: drop rates are
/// displayed in the gacha screen.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolEntryResponse {
    pub item_type: ItemType,
    pub item_key: String,
    pub rarity: Rarity,
    pub weight: i64,
}

impl From<&PoolEntry> for PoolEntryResponse {
    fn from(e: &PoolEntry) -> Self {
        PoolEntryResponse {
            item_type: e.item_type,
            item_key: e.item_key.clone(),
            rarity: e.rarity,
            weight: e.weight,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolResponse {
    pub pool_id: String,
    pub cost: i64,
    pub version: i32,
    pub total_weight: i64,
    pub entries: Vec<PoolEntryResponse>,
}

impl From<&PrizePool> for PoolResponse {
    fn from(p: &PrizePool) -> Self {
        PoolResponse {
            pool_id: p.pool_id.clone(),
            cost: p.cost,
            version: p.version,
            total_weight: p.total_weight(),
            entries: p.entries.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DrawRequest {
    pub pool_id: String,
    /// Idempotency key, one per button press. Retries after a timeout reuse
    /// it and get the original outcome back.
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawOutcomeResponse {
    pub id: i64,
    pub owner_kind: OwnerKind,
    pub owner_id: i64,
    pub pool_id: String,
    pub cost_paid: i64,
    pub item_type: ItemType,
    pub item_key: String,
    pub rarity: Rarity,
    pub transaction_id: i64,
    pub reference: String,
    pub issued_at: DateTime<Utc>,
}

impl From<draw_outcome_entity::Model> for DrawOutcomeResponse {
    fn from(m: draw_outcome_entity::Model) -> Self {
        DrawOutcomeResponse {
            id: m.id,
            owner_kind: m.owner_kind,
            owner_id: m.owner_id,
            pool_id: m.pool_id,
            cost_paid: m.cost_paid,
            item_type: m.item_type,
            item_key: m.item_key,
            rarity: m.rarity,
            transaction_id: m.transaction_id,
            reference: m.reference,
            issued_at: m.issued_at.unwrap_or_else(Utc::now),
        }
    }
}

pub type DrawOutcomePageResponse = CursorPage<DrawOutcomeResponse>;

/// What a draw hands back internally: the outcome for the response body plus
/// the ledger transaction that paid for it, so the handler can fan out both
/// the balance change and the reward grant events.
#[derive(Debug, Clone)]
pub struct DrawReceipt {
    pub outcome: DrawOutcomeResponse,
    pub cost_transaction: TransactionResponse,
}
