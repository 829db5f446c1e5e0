pub mod gacha_service;
pub mod ledger_service;
pub mod pool_catalog;
pub mod reward_service;

pub use gacha_service::*;
pub use ledger_service::*;
pub use pool_catalog::{PoolCatalog, PoolEntry, PrizePool};
pub use reward_service::*;
