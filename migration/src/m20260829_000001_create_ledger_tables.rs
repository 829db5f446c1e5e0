use sea_orm_migration::prelude::*;

/// Denormalized balance per owner; the transaction log below is the source
/// of truth.
#[derive(DeriveIden)]
enum Balances {
    Table,
    Id,
    OwnerKind,
    OwnerId,
    Amount,
    UpdatedAt,
}

/// Append-only ledger. `reference` is the caller's idempotency key, unique
/// per owner when present (NULLs do not collide).
#[derive(DeriveIden)]
enum PointTransactions {
    Table,
    Id,
    OwnerKind,
    OwnerId,
    Delta,
    ReasonCode,
    Reference,
    BalanceAfter,
    CreatedAt,
}

/// Owner unlocked-item relation, written only by the reward issuer.
#[derive(DeriveIden)]
enum InventoryItems {
    Table,
    Id,
    OwnerKind,
    OwnerId,
    ItemType,
    ItemKey,
    GrantedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Balances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Balances::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Balances::OwnerKind).string().not_null())
                    .col(ColumnDef::new(Balances::OwnerId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Balances::Amount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Balances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // One balance row per owner
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_balances_owner_unique")
                    .table(Balances::Table)
                    .col(Balances::OwnerKind)
                    .col(Balances::OwnerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Negative balances are a bug wherever they come from; the database
        // is the last line of defense
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE balances ADD CONSTRAINT chk_balances_amount_non_negative CHECK (amount >= 0)",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PointTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PointTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::OwnerKind)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::OwnerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::Delta)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::ReasonCode)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PointTransactions::Reference).string())
                    .col(
                        ColumnDef::new(PointTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // Idempotency backstop: a reference is consumed at most once per owner
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_point_transactions_owner_reference_unique")
                    .table(PointTransactions::Table)
                    .col(PointTransactions::OwnerKind)
                    .col(PointTransactions::OwnerId)
                    .col(PointTransactions::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // History pages scan by owner in id order
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_point_transactions_owner")
                    .table(PointTransactions::Table)
                    .col(PointTransactions::OwnerKind)
                    .col(PointTransactions::OwnerId)
                    .col(PointTransactions::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InventoryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::OwnerKind)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::OwnerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryItems::ItemType).string().not_null())
                    .col(ColumnDef::new(InventoryItems::ItemKey).string().not_null())
                    .col(
                        ColumnDef::new(InventoryItems::GrantedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // Granting an owned item must be a conflict, not a duplicate
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_inventory_items_owner_item_unique")
                    .table(InventoryItems::Table)
                    .col(InventoryItems::OwnerKind)
                    .col(InventoryItems::OwnerId)
                    .col(InventoryItems::ItemType)
                    .col(InventoryItems::ItemKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PointTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await?;
        Ok(())
    }
}
