pub mod admin;
pub mod gacha;
pub mod inventory;
pub mod points;

pub use admin::admin_config;
pub use gacha::gacha_config;
pub use inventory::inventory_config;
pub use points::points_config;
