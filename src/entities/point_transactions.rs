use super::balances::OwnerKind;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Why a ledger entry exists. Closed set; new codes are additive only and
/// must never change the meaning of stored rows.
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    #[sea_orm(string_value = "daily_login")]
    DailyLogin,
    #[sea_orm(string_value = "share_copy")]
    ShareCopy,
    #[sea_orm(string_value = "gacha_pull_cost")]
    GachaPullCost,
    #[sea_orm(string_value = "seed")]
    Seed,
    #[sea_orm(string_value = "admin_adjust")]
    AdminAdjust,
}

impl ReasonCode {
    /// Codes a client may submit through the earn endpoint. Everything else
    /// is produced server-side.
    pub fn is_earnable(&self) -> bool {
        matches!(
            self,
            ReasonCode::DailyLogin | ReasonCode::ShareCopy | ReasonCode::Seed
        )
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasonCode::DailyLogin => write!(f, "daily_login"),
            ReasonCode::ShareCopy => write!(f, "share_copy"),
            ReasonCode::GachaPullCost => write!(f, "gacha_pull_cost"),
            ReasonCode::Seed => write!(f, "seed"),
            ReasonCode::AdminAdjust => write!(f, "admin_adjust"),
        }
    }
}

/// Append-only ledger row. `delta` is signed and never zero; `reference` is
/// the caller-supplied idempotency key, unique per owner when present.
/// `balance_after` is a denormalized snapshot for history rendering and
/// reconciliation cross-checks.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "point_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner_kind: OwnerKind,
    pub owner_id: i64,
    pub delta: i64,
    pub reason_code: ReasonCode,
    pub reference: Option<String>,
    pub balance_after: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_code_wire_names() {
        assert_eq!(ReasonCode::DailyLogin.to_string(), "daily_login");
        assert_eq!(ReasonCode::GachaPullCost.to_string(), "gacha_pull_cost");
        assert_eq!(
            serde_json::to_string(&ReasonCode::ShareCopy).unwrap(),
            "\"share_copy\""
        );
    }

    #[test]
    fn test_only_bonus_codes_are_earnable() {
        assert!(ReasonCode::DailyLogin.is_earnable());
        assert!(ReasonCode::ShareCopy.is_earnable());
        assert!(ReasonCode::Seed.is_earnable());
        assert!(!ReasonCode::GachaPullCost.is_earnable());
        assert!(!ReasonCode::AdminAdjust.is_earnable());
    }
}
