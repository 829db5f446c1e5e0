use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema, DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[sea_orm(string_value = "frame")]
    Frame,
    #[sea_orm(string_value = "theme")]
    Theme,
    #[sea_orm(string_value = "title")]
    Title,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemType::Frame => write!(f, "frame"),
            ItemType::Theme => write!(f, "theme"),
            ItemType::Title => write!(f, "title"),
        }
    }
}

#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[sea_orm(string_value = "r")]
    R,
    #[sea_orm(string_value = "sr")]
    Sr,
    #[sea_orm(string_value = "ssr")]
    Ssr,
    #[sea_orm(string_value = "ur")]
    Ur,
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rarity::R => write!(f, "r"),
            Rarity::Sr => write!(f, "sr"),
            Rarity::Ssr => write!(f, "ssr"),
            Rarity::Ur => write!(f, "ur"),
        }
    }
}

/// One weighted row of a prize pool. `position` preserves the provisioned
/// order, which fixes tie-breaking at cumulative-weight boundaries. Pools
/// are never re-sorted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "gacha_pool_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub pool_id: String,
    pub position: i32,
    pub item_type: ItemType,
    pub item_key: String,
    pub rarity: Rarity,
    pub weight: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
