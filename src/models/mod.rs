pub mod common;
pub mod gacha;
pub mod inventory;
pub mod ledger;
pub mod owner;
pub mod pagination;

pub use common::*;
pub use gacha::*;
pub use inventory::*;
pub use ledger::*;
pub use owner::*;
pub use pagination::*;
