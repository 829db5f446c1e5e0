use std::sync::Arc;

use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::entities::{ReasonCode, draw_outcome_entity as outcomes};
use crate::error::{AppError, AppResult};
use crate::models::{
    CursorPage, CursorQuery, DrawOutcomePageResponse, DrawReceipt, Owner, PoolResponse,
};
use crate::services::pool_catalog::PoolCatalog;
use crate::services::{LedgerService, RewardService};

/// One atomic "pay points, win prize, unlock reward" draw.
///
/// The draw is two durable units of work. The cost debit commits first,
/// keyed by the caller's reference; prize grant and outcome record commit
/// together afterwards. A reference with a committed debit but no outcome is
/// the `DrawIncomplete` state, and replaying the reference resumes at
/// selection instead of debiting again — a retry can never double-charge or
/// double-grant.
#[derive(Clone)]
pub struct GachaService {
    pool: DatabaseConnection,
    catalog: Arc<PoolCatalog>,
    ledger: LedgerService,
    rewards: RewardService,
}

impl GachaService {
    pub fn new(
        pool: DatabaseConnection,
        catalog: Arc<PoolCatalog>,
        ledger: LedgerService,
        rewards: RewardService,
    ) -> Self {
        Self {
            pool,
            catalog,
            ledger,
            rewards,
        }
    }

    /// All published pools with their drop tables.
    pub fn list_pools(&self) -> Vec<PoolResponse> {
        self.catalog.pools().into_iter().map(Into::into).collect()
    }

    pub fn get_pool(&self, pool_id: &str) -> AppResult<PoolResponse> {
        Ok(self.catalog.get(pool_id)?.into())
    }

    /// Perform one paid draw, or replay/resume a previous one with the same
    /// reference.
    pub async fn draw(
        &self,
        owner: Owner,
        pool_id: &str,
        reference: &str,
    ) -> AppResult<DrawReceipt> {
        if reference.is_empty() {
            return Err(AppError::ValidationError(
                "Draw reference must not be empty".to_string(),
            ));
        }
        let pool = self.catalog.get(pool_id)?;

        // A used reference is either a completed draw (replay it verbatim)
        // or a debit left behind by an interrupted one (resume at selection)
        let prior_tx = self.ledger.find_by_reference(owner, reference).await?;
        if let Some(tx) = &prior_tx {
            if tx.reason_code != ReasonCode::GachaPullCost {
                return Err(AppError::ValidationError(format!(
                    "Reference {reference} was already used for {}",
                    tx.reason_code
                )));
            }
            if let Some(existing) = self.find_outcome_by_reference(owner, reference).await? {
                return Ok(DrawReceipt {
                    outcome: existing.into(),
                    cost_transaction: tx.clone().into(),
                });
            }
            // The resume must target the pool the debit paid for; a retry
            // that swapped pools could otherwise draw at the wrong price
            if -tx.delta != pool.cost {
                return Err(AppError::ValidationError(format!(
                    "Reference {reference} paid {} points, which is not the cost of pool {pool_id}",
                    -tx.delta
                )));
            }
            log::info!(
                "Resuming incomplete draw for {owner}, reference {reference}, transaction {}",
                tx.id
            );
        }
        let cost_tx = match prior_tx {
            Some(tx) => tx,
            None => {
                self.ledger
                    .debit(
                        owner,
                        pool.cost,
                        ReasonCode::GachaPullCost,
                        Some(reference.to_string()),
                    )
                    .await?
            }
        };

        // Weighted selection over the pool in its provisioned order
        let roll = rand::thread_rng().gen_range(0..pool.total_weight());
        let entry = pool.pick(roll);

        // Grant and outcome commit together; a prize can never be durably
        // granted without its outcome row
        let result: Result<outcomes::Model, AppError> = async {
            let txn = self.pool.begin().await?;
            self.rewards
                .grant(&txn, owner, entry.item_type, &entry.item_key)
                .await?;
            let outcome = outcomes::ActiveModel {
                owner_kind: Set(owner.kind),
                owner_id: Set(owner.id),
                pool_id: Set(pool.pool_id.clone()),
                pool_version: Set(pool.version),
                cost_paid: Set(-cost_tx.delta),
                item_type: Set(entry.item_type),
                item_key: Set(entry.item_key.clone()),
                rarity: Set(entry.rarity),
                transaction_id: Set(cost_tx.id),
                reference: Set(reference.to_string()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            txn.commit().await?;
            Ok(outcome)
        }
        .await;

        match result {
            Ok(outcome) => Ok(DrawReceipt {
                outcome: outcome.into(),
                cost_transaction: cost_tx.into(),
            }),
            Err(AppError::DatabaseError(e)) if is_unique_violation(&e) => {
                // A concurrent retry with the same reference finished first;
                // its outcome is the canonical one
                let outcome = self
                    .find_outcome_by_reference(owner, reference)
                    .await?
                    .ok_or(AppError::DrawIncomplete {
                        transaction_id: cost_tx.id,
                    })?;
                Ok(DrawReceipt {
                    outcome: outcome.into(),
                    cost_transaction: cost_tx.into(),
                })
            }
            Err(e) => {
                log::error!(
                    "Draw for {owner} debited transaction {} but failed to issue reward: {e}",
                    cost_tx.id
                );
                Err(AppError::DrawIncomplete {
                    transaction_id: cost_tx.id,
                })
            }
        }
    }

    /// Draw history, newest first.
    pub async fn list_outcomes(
        &self,
        owner: Owner,
        query: &CursorQuery,
    ) -> AppResult<DrawOutcomePageResponse> {
        let limit = query.get_limit();
        let mut find = outcomes::Entity::find()
            .filter(outcomes::Column::OwnerKind.eq(owner.kind))
            .filter(outcomes::Column::OwnerId.eq(owner.id))
            .order_by_desc(outcomes::Column::Id)
            .limit(limit + 1);
        if let Some(cursor) = query.cursor {
            find = find.filter(outcomes::Column::Id.lt(cursor));
        }
        let rows = find.all(&self.pool).await?;
        Ok(CursorPage::from_rows(rows, limit, |m| (m.id, m.into())))
    }

    async fn find_outcome_by_reference(
        &self,
        owner: Owner,
        reference: &str,
    ) -> AppResult<Option<outcomes::Model>> {
        let row = outcomes::Entity::find()
            .filter(outcomes::Column::OwnerKind.eq(owner.kind))
            .filter(outcomes::Column::OwnerId.eq(owner.id))
            .filter(outcomes::Column::Reference.eq(reference))
            .one(&self.pool)
            .await?;
        Ok(row)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        ItemType, OwnerKind, Rarity, pool_entity, pool_entry_entity, transaction_entity as txns,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    // Single-entry pool so selection is deterministic and the tests can focus
    // on the reference lifecycle
    fn catalog() -> Arc<PoolCatalog> {
        let pool = pool_entity::Model {
            pool_id: "standard".to_string(),
            cost: 100,
            version: 1,
            is_active: true,
            created_at: None,
        };
        let entry = pool_entry_entity::Model {
            id: 1,
            pool_id: "standard".to_string(),
            position: 0,
            item_type: ItemType::Frame,
            item_key: "frame_gold".to_string(),
            rarity: Rarity::Sr,
            weight: 1,
            created_at: None,
        };
        Arc::new(PoolCatalog::from_rows(vec![(pool, vec![entry])]).unwrap())
    }

    fn service(db: DatabaseConnection) -> GachaService {
        let catalog = catalog();
        let ledger = LedgerService::new(db.clone());
        let rewards = RewardService::new(db.clone(), catalog.clone());
        GachaService::new(db, catalog, ledger, rewards)
    }

    fn cost_tx(id: i64, delta: i64, reason_code: ReasonCode, reference: &str) -> txns::Model {
        txns::Model {
            id,
            owner_kind: OwnerKind::User,
            owner_id: 7,
            delta,
            reason_code,
            reference: Some(reference.to_string()),
            balance_after: 900,
            created_at: None,
        }
    }

    fn outcome_row(id: i64, transaction_id: i64, reference: &str) -> outcomes::Model {
        outcomes::Model {
            id,
            owner_kind: OwnerKind::User,
            owner_id: 7,
            pool_id: "standard".to_string(),
            pool_version: 1,
            cost_paid: 100,
            item_type: ItemType::Frame,
            item_key: "frame_gold".to_string(),
            rarity: Rarity::Sr,
            transaction_id,
            reference: reference.to_string(),
            issued_at: None,
        }
    }

    #[tokio::test]
    async fn test_draw_replays_completed_outcome() {
        // Reference lookup finds the debit, outcome lookup finds the prize;
        // nothing else runs, so no re-roll and no second charge
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![cost_tx(51, -100, ReasonCode::GachaPullCost, "draw-1")]])
            .append_query_results([vec![outcome_row(9, 51, "draw-1")]])
            .into_connection();

        let receipt = service(db)
            .draw(Owner::user(7), "standard", "draw-1")
            .await
            .unwrap();
        assert_eq!(receipt.outcome.id, 9);
        assert_eq!(receipt.outcome.transaction_id, 51);
        assert_eq!(receipt.cost_transaction.delta, -100);
        assert_eq!(receipt.cost_transaction.balance_after, 900);
    }

    #[tokio::test]
    async fn test_draw_resumes_debited_reference_without_second_debit() {
        // Debit committed, outcome missing: the draw resumes at selection,
        // grants the prize, and records the outcome against the old debit
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![cost_tx(51, -100, ReasonCode::GachaPullCost, "draw-1")]])
            .append_query_results([Vec::<outcomes::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .append_query_results([vec![outcome_row(9, 51, "draw-1")]])
            .into_connection();

        let receipt = service(db)
            .draw(Owner::user(7), "standard", "draw-1")
            .await
            .unwrap();
        assert_eq!(receipt.outcome.transaction_id, 51);
        assert_eq!(receipt.cost_transaction.id, 51);
    }

    #[tokio::test]
    async fn test_draw_rejects_reference_used_by_other_reason() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![cost_tx(51, 30, ReasonCode::DailyLogin, "draw-1")]])
            .into_connection();

        let err = service(db)
            .draw(Owner::user(7), "standard", "draw-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_draw_rejects_resume_against_different_pool_cost() {
        // Debit of 40 cannot resume into a 100-point pool
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![cost_tx(51, -40, ReasonCode::GachaPullCost, "draw-1")]])
            .append_query_results([Vec::<outcomes::Model>::new()])
            .into_connection();

        let err = service(db)
            .draw(Owner::user(7), "standard", "draw-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
