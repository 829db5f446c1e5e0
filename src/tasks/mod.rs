//! Background scheduled tasks.
//!
//! The only recurring job is ledger reconciliation: the transaction log is
//! the source of truth, the `balances` table a denormalized read model, and
//! this job verifies the two agree. Call `spawn_all` once during startup.

use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use sea_orm::{
    AccessMode, DatabaseConnection, EntityTrait, FromQueryResult, IsolationLevel, QuerySelect,
    TransactionTrait,
};

use crate::entities::{OwnerKind, balance_entity as balances, transaction_entity as txns};
use crate::error::AppResult;

/// Spawn all background tasks. Detaches via `tokio::spawn`, does not block.
pub fn spawn_all(pool: DatabaseConnection, reconciliation_interval_secs: u64) {
    tokio::spawn(async move {
        loop {
            match reconcile_balances(&pool).await {
                Ok(0) => log::debug!("Ledger reconciliation clean"),
                Ok(n) => log::error!("Ledger reconciliation found {n} drifted balances"),
                Err(e) => log::error!("Ledger reconciliation failed: {e:?}"),
            }
            tokio::time::sleep(std::time::Duration::from_secs(reconciliation_interval_secs))
                .await;
        }
    });
}

#[derive(Debug, FromQueryResult)]
struct LedgerSumRow {
    owner_kind: OwnerKind,
    owner_id: i64,
    total: Option<i64>,
}

/// Recompute every owner's running delta sum from the transaction log and
/// compare it to the stored balance. Returns the number of owners whose
/// balance has drifted; each one is logged for operator follow-up. Drift
/// here means a bug or manual data surgery — the code paths that write both
/// sides do so in one database transaction.
///
/// Both reads run inside one REPEATABLE READ transaction so they see the
/// same snapshot; a ledger write committing between them must not show up as
/// phantom drift.
pub async fn reconcile_balances(pool: &DatabaseConnection) -> AppResult<u64> {
    let txn = pool
        .begin_with_config(
            Some(IsolationLevel::RepeatableRead),
            Some(AccessMode::ReadOnly),
        )
        .await?;

    let sums = txns::Entity::find()
        .select_only()
        .column(txns::Column::OwnerKind)
        .column(txns::Column::OwnerId)
        .column_as(Expr::col(txns::Column::Delta).sum(), "total")
        .group_by(txns::Column::OwnerKind)
        .group_by(txns::Column::OwnerId)
        .into_model::<LedgerSumRow>()
        .all(&txn)
        .await?;

    let mut expected: HashMap<(OwnerKind, i64), i64> = HashMap::new();
    for row in sums {
        expected.insert((row.owner_kind, row.owner_id), row.total.unwrap_or(0));
    }

    let stored = balances::Entity::find().all(&txn).await?;
    txn.commit().await?;

    let mut drifted = 0u64;
    for balance in stored {
        let key = (balance.owner_kind, balance.owner_id);
        // Owners with a balance row but no transactions must sit at zero
        let ledger_total = expected.remove(&key).unwrap_or(0);
        if balance.amount != ledger_total {
            drifted += 1;
            log::error!(
                "Balance drift for {}:{}: stored {}, ledger sum {}",
                balance.owner_kind,
                balance.owner_id,
                balance.amount,
                ledger_total
            );
        }
    }

    // Transactions without a balance row should not exist either
    for ((kind, id), total) in expected {
        if total != 0 {
            drifted += 1;
            log::error!("Ledger sum {total} for {kind}:{id} has no balance row");
        }
    }

    Ok(drifted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn sum_row(kind: &str, id: i64, total: i64) -> BTreeMap<&'static str, Value> {
        let mut row = BTreeMap::new();
        row.insert("owner_kind", Value::from(kind.to_string()));
        row.insert("owner_id", Value::from(id));
        row.insert("total", Value::from(total));
        row
    }

    fn balance(id: i64, owner_id: i64, amount: i64) -> balances::Model {
        balances::Model {
            id,
            owner_kind: OwnerKind::User,
            owner_id,
            amount,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_reconcile_clean_when_sums_match() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sum_row("user", 1, 100)]])
            .append_query_results([vec![balance(1, 1, 100)]])
            .into_connection();
        assert_eq!(reconcile_balances(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_flags_drift_and_orphans() {
        // user:2 has transactions but no balance row; user:3 has a balance
        // with no transactions behind it; user:1 is consistent
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sum_row("user", 1, 100), sum_row("user", 2, 50)]])
            .append_query_results([vec![balance(1, 1, 100), balance(2, 3, 5)]])
            .into_connection();
        assert_eq!(reconcile_balances(&db).await.unwrap(), 2);
    }
}
