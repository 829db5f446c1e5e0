use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{OwnerKind, ReasonCode, balance_entity, transaction_entity};

use super::CursorPage;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub owner_kind: OwnerKind,
    pub owner_id: i64,
    pub amount: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<balance_entity::Model> for BalanceResponse {
    fn from(m: balance_entity::Model) -> Self {
        BalanceResponse {
            owner_kind: m.owner_kind,
            owner_id: m.owner_id,
            amount: m.amount,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i64,
    pub delta: i64,
    pub reason_code: ReasonCode,
    pub reference: Option<String>,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

impl From<transaction_entity::Model> for TransactionResponse {
    fn from(m: transaction_entity::Model) -> Self {
        TransactionResponse {
            id: m.id,
            delta: m.delta,
            reason_code: m.reason_code,
            reference: m.reference,
            balance_after: m.balance_after,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Client-triggered point award (daily login bonus, share bonus, signup
/// seed). Restricted to the earnable reason codes server-side.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EarnRequest {
    pub reason_code: ReasonCode,
    pub amount: i64,
    /// Idempotency key, one per logical user action.
    pub reference: Option<String>,
}

/// Signed manual correction applied by operations tooling.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminAdjustRequest {
    pub owner_kind: OwnerKind,
    pub owner_id: i64,
    pub delta: i64,
    pub reference: Option<String>,
}

pub type TransactionPageResponse = CursorPage<TransactionResponse>;
