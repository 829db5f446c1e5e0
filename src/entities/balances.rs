use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Currency namespace. User points and circle points never mix: a balance
/// row is keyed by (owner_kind, owner_id).
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema, DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "circle")]
    Circle,
}

impl std::fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnerKind::User => write!(f, "user"),
            OwnerKind::Circle => write!(f, "circle"),
        }
    }
}

impl std::str::FromStr for OwnerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(OwnerKind::User),
            "circle" => Ok(OwnerKind::Circle),
            _ => Err(()),
        }
    }
}

/// Denormalized balance per owner. The transaction log is the source of
/// truth; `amount` must always equal that owner's running delta sum and is
/// never allowed below zero.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "balances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner_kind: OwnerKind,
    pub owner_id: i64,
    pub amount: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
