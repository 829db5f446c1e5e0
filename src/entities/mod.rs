pub mod balances;
pub mod draw_outcomes;
pub mod gacha_pool_entries;
pub mod gacha_pools;
pub mod inventory_items;
pub mod point_transactions;

pub use balances as balance_entity;
pub use draw_outcomes as draw_outcome_entity;
pub use gacha_pool_entries as pool_entry_entity;
pub use gacha_pools as pool_entity;
pub use inventory_items as inventory_item_entity;
pub use point_transactions as transaction_entity;

pub use balances::OwnerKind;
pub use gacha_pool_entries::{ItemType, Rarity};
pub use point_transactions::ReasonCode;
