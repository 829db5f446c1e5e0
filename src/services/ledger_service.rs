use crate::entities::{ReasonCode, balance_entity as balances, transaction_entity as txns};
use crate::error::{AppError, AppResult};
use crate::models::{CursorPage, CursorQuery, Owner, TransactionPageResponse};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

/// Per-owner balance plus append-only transaction history.
///
/// Linearizability of concurrent debits against one owner comes from the
/// storage layer, not an in-process lock: the balance decrement is a single
/// conditional UPDATE (`amount >= required` in the WHERE clause), so Postgres
/// row locking is the per-owner serialization point and the guarantee
/// survives restarts and multiple instances. Idempotency is by caller
/// reference, unique per owner, with a partial unique index as the backstop
/// under races.
#[derive(Clone)]
pub struct LedgerService {
    pool: DatabaseConnection,
}

impl LedgerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Add points. Always succeeds, unless the reference was already used by
    /// this owner, in which case the prior transaction is returned unchanged.
    pub async fn credit(
        &self,
        owner: Owner,
        amount: i64,
        reason_code: ReasonCode,
        reference: Option<String>,
    ) -> AppResult<txns::Model> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "Credit amount must be positive".to_string(),
            ));
        }
        self.apply(owner, amount, reason_code, reference).await
    }

    /// Remove points. Fails with `InsufficientBalance` without touching any
    /// state when the owner cannot afford the full amount.
    pub async fn debit(
        &self,
        owner: Owner,
        amount: i64,
        reason_code: ReasonCode,
        reference: Option<String>,
    ) -> AppResult<txns::Model> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "Debit amount must be positive".to_string(),
            ));
        }
        self.apply(owner, -amount, reason_code, reference).await
    }

    /// Signed delta entry point for admin adjustments.
    pub async fn adjust(
        &self,
        owner: Owner,
        delta: i64,
        reference: Option<String>,
    ) -> AppResult<txns::Model> {
        if delta == 0 {
            return Err(AppError::ValidationError(
                "Adjustment delta must be non-zero".to_string(),
            ));
        }
        self.apply(owner, delta, ReasonCode::AdminAdjust, reference)
            .await
    }

    /// Balance row, if the owner has ever transacted. Callers render the
    /// implicit zero themselves so they can still show `updated_at`.
    pub async fn balance_row_of(&self, owner: Owner) -> AppResult<Option<balances::Model>> {
        let row = balances::Entity::find()
            .filter(balances::Column::OwnerKind.eq(owner.kind))
            .filter(balances::Column::OwnerId.eq(owner.id))
            .one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Transaction history, newest first, keyset-paginated so concurrent
    /// appends never skip or duplicate rows mid-pagination.
    pub async fn history_of(
        &self,
        owner: Owner,
        query: &CursorQuery,
    ) -> AppResult<TransactionPageResponse> {
        let limit = query.get_limit();
        let mut find = txns::Entity::find()
            .filter(txns::Column::OwnerKind.eq(owner.kind))
            .filter(txns::Column::OwnerId.eq(owner.id))
            .order_by_desc(txns::Column::Id)
            .limit(limit + 1);
        if let Some(cursor) = query.cursor {
            find = find.filter(txns::Column::Id.lt(cursor));
        }
        let rows = find.all(&self.pool).await?;
        Ok(CursorPage::from_rows(rows, limit, |m| (m.id, m.into())))
    }

    /// Look up the transaction recorded for an idempotency reference.
    pub async fn find_by_reference(
        &self,
        owner: Owner,
        reference: &str,
    ) -> AppResult<Option<txns::Model>> {
        let row = txns::Entity::find()
            .filter(txns::Column::OwnerKind.eq(owner.kind))
            .filter(txns::Column::OwnerId.eq(owner.id))
            .filter(txns::Column::Reference.eq(reference))
            .one(&self.pool)
            .await?;
        Ok(row)
    }

    // -----------------------------
    // Internals
    // -----------------------------

    async fn apply(
        &self,
        owner: Owner,
        delta: i64,
        reason_code: ReasonCode,
        reference: Option<String>,
    ) -> AppResult<txns::Model> {
        if let Some(r) = &reference
            && r.is_empty()
        {
            return Err(AppError::ValidationError(
                "Reference must not be empty".to_string(),
            ));
        }

        let txn = self.pool.begin().await.map_err(map_contention)?;

        // Idempotent replay: an already-consumed reference returns the
        // original transaction and changes nothing
        if let Some(r) = &reference
            && let Some(existing) = find_by_reference_tx(&txn, owner, r).await?
        {
            txn.commit().await.map_err(map_contention)?;
            return Ok(existing);
        }

        ensure_balance_tx(&txn, owner).await?;

        // One conditional UPDATE; for debits the balance check rides in the
        // WHERE clause so two racing debits can never both pass it
        let mut update = balances::Entity::update_many()
            .col_expr(
                balances::Column::Amount,
                Expr::col(balances::Column::Amount).add(delta),
            )
            .col_expr(balances::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(balances::Column::OwnerKind.eq(owner.kind))
            .filter(balances::Column::OwnerId.eq(owner.id));
        if delta < 0 {
            update = update.filter(balances::Column::Amount.gte(-delta));
        }
        let result = update.exec(&txn).await.map_err(map_contention)?;

        if result.rows_affected == 0 {
            let balance = balance_in_tx(&txn, owner).await?;
            txn.rollback().await.ok();
            return Err(AppError::InsufficientBalance {
                balance,
                required: -delta,
            });
        }

        let balance_after = balance_in_tx(&txn, owner).await?;

        let inserted = txns::ActiveModel {
            owner_kind: Set(owner.kind),
            owner_id: Set(owner.id),
            delta: Set(delta),
            reason_code: Set(reason_code),
            reference: Set(reference.clone()),
            balance_after: Set(balance_after),
            ..Default::default()
        }
        .insert(&txn)
        .await;

        match inserted {
            Ok(model) => {
                txn.commit().await.map_err(map_contention)?;
                Ok(model)
            }
            Err(e) if is_unique_violation(&e) => {
                // Lost a reference race; the winner's transaction is the
                // canonical one
                txn.rollback().await.ok();
                let r = reference.as_deref().unwrap_or_default();
                self.find_by_reference(owner, r)
                    .await?
                    .ok_or_else(|| AppError::InternalError(
                        format!("Transaction for reference {r} vanished after conflict"),
                    ))
            }
            Err(e) => Err(map_contention(e)),
        }
    }
}

async fn find_by_reference_tx(
    txn: &DatabaseTransaction,
    owner: Owner,
    reference: &str,
) -> AppResult<Option<txns::Model>> {
    let row = txns::Entity::find()
        .filter(txns::Column::OwnerKind.eq(owner.kind))
        .filter(txns::Column::OwnerId.eq(owner.id))
        .filter(txns::Column::Reference.eq(reference))
        .one(txn)
        .await?;
    Ok(row)
}

/// Lazily create the zero-balance row. `ON CONFLICT DO NOTHING` keeps a
/// racing creation from aborting the surrounding transaction.
async fn ensure_balance_tx(txn: &impl ConnectionTrait, owner: Owner) -> AppResult<()> {
    balances::Entity::insert(balances::ActiveModel {
        owner_kind: Set(owner.kind),
        owner_id: Set(owner.id),
        amount: Set(0),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([balances::Column::OwnerKind, balances::Column::OwnerId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

async fn balance_in_tx(txn: &DatabaseTransaction, owner: Owner) -> AppResult<i64> {
    let row = balances::Entity::find()
        .filter(balances::Column::OwnerKind.eq(owner.kind))
        .filter(balances::Column::OwnerId.eq(owner.id))
        .one(txn)
        .await?;
    Ok(row.map(|b| b.amount).unwrap_or(0))
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Lock and serialization failures surface as `Busy` so callers retry with
/// backoff instead of seeing an opaque 500.
fn map_contention(err: DbErr) -> AppError {
    let msg = err.to_string();
    if msg.contains("deadlock detected")
        || msg.contains("lock timeout")
        || msg.contains("could not serialize access")
    {
        AppError::Busy
    } else {
        AppError::DatabaseError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::OwnerKind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn test_contention_mapping() {
        let err = DbErr::Custom("deadlock detected".to_string());
        assert!(matches!(map_contention(err), AppError::Busy));

        let err = DbErr::Custom("relation does not exist".to_string());
        assert!(matches!(map_contention(err), AppError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_credit_replays_existing_reference() {
        let existing = txns::Model {
            id: 41,
            owner_kind: OwnerKind::User,
            owner_id: 7,
            delta: 30,
            reason_code: ReasonCode::DailyLogin,
            reference: Some("login-2026-08-29".to_string()),
            balance_after: 130,
            created_at: None,
        };
        // Only the reference lookup is queued; a second award attempt would
        // hit the mock with an unexpected statement and fail the test
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .into_connection();

        let ledger = LedgerService::new(db);
        let tx = ledger
            .credit(
                Owner::user(7),
                30,
                ReasonCode::DailyLogin,
                Some("login-2026-08-29".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(tx, existing);
    }

    #[tokio::test]
    async fn test_debit_reports_balance_and_required_without_mutating() {
        // Conditional UPDATE misses (rows_affected 0), balance read back for
        // the error payload, transaction rolled back
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .append_query_results([vec![balances::Model {
                id: 1,
                owner_kind: OwnerKind::User,
                owner_id: 7,
                amount: 20,
                updated_at: None,
            }]])
            .into_connection();

        let ledger = LedgerService::new(db);
        let err = ledger
            .debit(Owner::user(7), 100, ReasonCode::GachaPullCost, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientBalance {
                balance: 20,
                required: 100
            }
        ));
    }
}
