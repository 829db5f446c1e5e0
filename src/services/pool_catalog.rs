use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{ItemType, Rarity, pool_entity, pool_entry_entity};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    pub item_type: ItemType,
    pub item_key: String,
    pub rarity: Rarity,
    pub weight: i64,
}

/// An immutable published prize pool. Entries keep their provisioned order;
/// order decides which entry wins ties at cumulative-weight boundaries, so
/// re-sorting would silently change drop behavior.
#[derive(Debug, Clone)]
pub struct PrizePool {
    pub pool_id: String,
    pub cost: i64,
    pub version: i32,
    pub entries: Vec<PoolEntry>,
}

impl PrizePool {
    pub fn total_weight(&self) -> i64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Cumulative-distribution pick. `roll` must be in `[0, total_weight)`;
    /// the first entry whose running weight sum exceeds the roll wins.
    pub fn pick(&self, roll: i64) -> &PoolEntry {
        let mut acc = 0;
        for entry in &self.entries {
            acc += entry.weight;
            if roll < acc {
                return entry;
            }
        }
        // Unreachable for a valid roll; pools are validated non-empty
        self.entries.last().expect("validated pool has entries")
    }
}

/// Read-only pool lookup. Loaded once at startup from the provisioned
/// tables, validated, then shared across all request handlers without
/// locking (wrapped in an `Arc` by the caller).
pub struct PoolCatalog {
    pools: HashMap<String, PrizePool>,
    known_items: HashSet<(ItemType, String)>,
}

impl PoolCatalog {
    pub async fn load(db: &DatabaseConnection) -> AppResult<Self> {
        let pool_rows = pool_entity::Entity::find()
            .filter(pool_entity::Column::IsActive.eq(true))
            .order_by_asc(pool_entity::Column::PoolId)
            .all(db)
            .await?;

        let entry_rows = pool_entry_entity::Entity::find()
            .order_by_asc(pool_entry_entity::Column::PoolId)
            .order_by_asc(pool_entry_entity::Column::Position)
            .all(db)
            .await?;

        let mut entries_by_pool: HashMap<String, Vec<pool_entry_entity::Model>> = HashMap::new();
        for row in entry_rows {
            entries_by_pool
                .entry(row.pool_id.clone())
                .or_default()
                .push(row);
        }

        let parts = pool_rows
            .into_iter()
            .map(|p| {
                let entries = entries_by_pool.remove(&p.pool_id).unwrap_or_default();
                (p, entries)
            })
            .collect();

        Self::from_rows(parts)
    }

    /// Pure constructor over already-fetched rows; does all validation.
    pub fn from_rows(
        parts: Vec<(pool_entity::Model, Vec<pool_entry_entity::Model>)>,
    ) -> AppResult<Self> {
        let mut pools = HashMap::new();
        let mut known_items = HashSet::new();

        for (pool_row, entry_rows) in parts {
            if entry_rows.is_empty() {
                return Err(AppError::ConfigError(format!(
                    "Pool {} has no entries",
                    pool_row.pool_id
                )));
            }
            if pool_row.cost <= 0 {
                return Err(AppError::ConfigError(format!(
                    "Pool {} has non-positive cost {}",
                    pool_row.pool_id, pool_row.cost
                )));
            }

            let mut entries = Vec::with_capacity(entry_rows.len());
            for row in entry_rows {
                if row.weight <= 0 {
                    return Err(AppError::ConfigError(format!(
                        "Pool {} entry {} has non-positive weight {}",
                        pool_row.pool_id, row.item_key, row.weight
                    )));
                }
                known_items.insert((row.item_type, row.item_key.clone()));
                entries.push(PoolEntry {
                    item_type: row.item_type,
                    item_key: row.item_key,
                    rarity: row.rarity,
                    weight: row.weight,
                });
            }

            pools.insert(
                pool_row.pool_id.clone(),
                PrizePool {
                    pool_id: pool_row.pool_id,
                    cost: pool_row.cost,
                    version: pool_row.version,
                    entries,
                },
            );
        }

        Ok(Self { pools, known_items })
    }

    pub fn get(&self, pool_id: &str) -> AppResult<&PrizePool> {
        self.pools
            .get(pool_id)
            .ok_or_else(|| AppError::PoolNotFound(pool_id.to_string()))
    }

    /// All published pools, sorted by id for a stable listing.
    pub fn pools(&self) -> Vec<&PrizePool> {
        let mut list: Vec<&PrizePool> = self.pools.values().collect();
        list.sort_by(|a, b| a.pool_id.cmp(&b.pool_id));
        list
    }

    /// Whether any published pool can produce this item. Used by the reward
    /// issuer to reject grants for unknown items.
    pub fn is_known_item(&self, item_type: ItemType, item_key: &str) -> bool {
        self.known_items
            .contains(&(item_type, item_key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_row(pool_id: &str, cost: i64) -> pool_entity::Model {
        pool_entity::Model {
            pool_id: pool_id.to_string(),
            cost,
            version: 1,
            is_active: true,
            created_at: None,
        }
    }

    fn entry_row(pool_id: &str, position: i32, item_key: &str, weight: i64) -> pool_entry_entity::Model {
        pool_entry_entity::Model {
            id: position as i64,
            pool_id: pool_id.to_string(),
            position,
            item_type: ItemType::Frame,
            item_key: item_key.to_string(),
            rarity: Rarity::R,
            weight,
            created_at: None,
        }
    }

    fn catalog_with_weights(weights: &[i64]) -> PoolCatalog {
        let entries = weights
            .iter()
            .enumerate()
            .map(|(i, w)| entry_row("standard", i as i32, &format!("frame_{i}"), *w))
            .collect();
        PoolCatalog::from_rows(vec![(pool_row("standard", 100), entries)]).unwrap()
    }

    #[test]
    fn test_empty_pool_rejected() {
        let result = PoolCatalog::from_rows(vec![(pool_row("standard", 100), vec![])]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_zero_weight_rejected() {
        let result = PoolCatalog::from_rows(vec![(
            pool_row("standard", 100),
            vec![entry_row("standard", 0, "frame_a", 0)],
        )]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_unknown_pool_id() {
        let catalog = catalog_with_weights(&[1]);
        assert!(matches!(
            catalog.get("nonexistent"),
            Err(AppError::PoolNotFound(_))
        ));
    }

    #[test]
    fn test_entry_order_preserved() {
        let catalog = catalog_with_weights(&[55, 25, 12, 7, 1]);
        let pool = catalog.get("standard").unwrap();
        let keys: Vec<&str> = pool.entries.iter().map(|e| e.item_key.as_str()).collect();
        assert_eq!(keys, vec!["frame_0", "frame_1", "frame_2", "frame_3", "frame_4"]);
        assert_eq!(pool.total_weight(), 100);
    }

    #[test]
    fn test_pick_boundaries() {
        let catalog = catalog_with_weights(&[55, 25, 12, 7, 1]);
        let pool = catalog.get("standard").unwrap();
        // Cumulative bounds: [0,55) [55,80) [80,92) [92,99) [99,100)
        assert_eq!(pool.pick(0).item_key, "frame_0");
        assert_eq!(pool.pick(54).item_key, "frame_0");
        assert_eq!(pool.pick(55).item_key, "frame_1");
        assert_eq!(pool.pick(79).item_key, "frame_1");
        assert_eq!(pool.pick(80).item_key, "frame_2");
        assert_eq!(pool.pick(92).item_key, "frame_3");
        assert_eq!(pool.pick(99).item_key, "frame_4");
    }

    #[test]
    fn test_seeded_distribution_tracks_weights() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let catalog = catalog_with_weights(&[55, 25, 12, 7, 1]);
        let pool = catalog.get("standard").unwrap();
        let total = pool.total_weight();

        let mut rng = StdRng::seed_from_u64(20260829);
        let trials = 100_000usize;
        let mut counts = [0usize; 5];
        for _ in 0..trials {
            let roll = rng.gen_range(0..total);
            let won = pool.pick(roll);
            let idx: usize = won.item_key["frame_".len()..].parse().unwrap();
            counts[idx] += 1;
        }

        // Within one percentage point of the configured probability
        let expected = [0.55, 0.25, 0.12, 0.07, 0.01];
        for (i, &count) in counts.iter().enumerate() {
            let observed = count as f64 / trials as f64;
            assert!(
                (observed - expected[i]).abs() < 0.01,
                "entry {i}: observed {observed}, expected {}",
                expected[i]
            );
        }
    }

    #[test]
    fn test_single_entry_pool_always_wins() {
        // A one-entry pool is a guaranteed grant regardless of the roll
        let catalog = PoolCatalog::from_rows(vec![(
            pool_row("starter", 100),
            vec![entry_row("starter", 0, "frame_seiman_star", 100)],
        )])
        .unwrap();
        let pool = catalog.get("starter").unwrap();
        for roll in [0, 1, 50, 99] {
            assert_eq!(pool.pick(roll).item_key, "frame_seiman_star");
        }
    }

    #[test]
    fn test_is_known_item() {
        let catalog = catalog_with_weights(&[1]);
        assert!(catalog.is_known_item(ItemType::Frame, "frame_0"));
        assert!(!catalog.is_known_item(ItemType::Theme, "frame_0"));
        assert!(!catalog.is_known_item(ItemType::Frame, "missing"));
    }
}
