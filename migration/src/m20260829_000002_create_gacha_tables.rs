use sea_orm_migration::prelude::*;

/// Prize pool header. Pools are versioned and immutable once published;
/// republishing bumps `version` and replaces the entries.
#[derive(DeriveIden)]
enum GachaPools {
    Table,
    PoolId,
    Cost,
    Version,
    IsActive,
    CreatedAt,
}

/// Weighted pool rows. `position` fixes the provisioned order, which the
/// engine walks during cumulative-distribution selection.
#[derive(DeriveIden)]
enum GachaPoolEntries {
    Table,
    Id,
    PoolId,
    Position,
    ItemType,
    ItemKey,
    Rarity,
    Weight,
    CreatedAt,
}

/// One row per successful paid draw, linking the cost transaction, the pool
/// and the won entry. Write-once audit record.
#[derive(DeriveIden)]
enum DrawOutcomes {
    Table,
    Id,
    OwnerKind,
    OwnerId,
    PoolId,
    PoolVersion,
    CostPaid,
    ItemType,
    ItemKey,
    Rarity,
    TransactionId,
    Reference,
    IssuedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Seeds the launch pool "standard" (cost 100):
/// - frame_seiman_star       R   weight 55
/// - theme_sakura_night      SR  weight 25
/// - title_circle_regular    SR  weight 12
/// - frame_gold_lacquer      SSR weight 7
/// - title_legend_of_seiman  UR  weight 1
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GachaPools::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GachaPools::PoolId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GachaPools::Cost).big_integer().not_null())
                    .col(
                        ColumnDef::new(GachaPools::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(GachaPools::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(GachaPools::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GachaPoolEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GachaPoolEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GachaPoolEntries::PoolId).string().not_null())
                    .col(
                        ColumnDef::new(GachaPoolEntries::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GachaPoolEntries::ItemType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GachaPoolEntries::ItemKey)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GachaPoolEntries::Rarity).string().not_null())
                    .col(
                        ColumnDef::new(GachaPoolEntries::Weight)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GachaPoolEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_gacha_pool_entries_pool_position_unique")
                    .table(GachaPoolEntries::Table)
                    .col(GachaPoolEntries::PoolId)
                    .col(GachaPoolEntries::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DrawOutcomes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrawOutcomes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DrawOutcomes::OwnerKind).string().not_null())
                    .col(
                        ColumnDef::new(DrawOutcomes::OwnerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DrawOutcomes::PoolId).string().not_null())
                    .col(
                        ColumnDef::new(DrawOutcomes::PoolVersion)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DrawOutcomes::CostPaid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DrawOutcomes::ItemType).string().not_null())
                    .col(ColumnDef::new(DrawOutcomes::ItemKey).string().not_null())
                    .col(ColumnDef::new(DrawOutcomes::Rarity).string().not_null())
                    .col(
                        ColumnDef::new(DrawOutcomes::TransactionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DrawOutcomes::Reference).string().not_null())
                    .col(
                        ColumnDef::new(DrawOutcomes::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // One outcome per draw reference; concurrent retries collapse here
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_outcomes_owner_reference_unique")
                    .table(DrawOutcomes::Table)
                    .col(DrawOutcomes::OwnerKind)
                    .col(DrawOutcomes::OwnerId)
                    .col(DrawOutcomes::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_outcomes_owner")
                    .table(DrawOutcomes::Table)
                    .col(DrawOutcomes::OwnerKind)
                    .col(DrawOutcomes::OwnerId)
                    .col(DrawOutcomes::Id)
                    .to_owned(),
            )
            .await?;

        // Launch pool
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(GachaPools::Table)
                    .columns([GachaPools::PoolId, GachaPools::Cost, GachaPools::Version])
                    .values_panic(["standard".into(), 100.into(), 1.into()])
                    .to_owned(),
            )
            .await?;

        let entries: [(i32, &str, &str, &str, i64); 5] = [
            (0, "frame", "frame_seiman_star", "r", 55),
            (1, "theme", "theme_sakura_night", "sr", 25),
            (2, "title", "title_circle_regular", "sr", 12),
            (3, "frame", "frame_gold_lacquer", "ssr", 7),
            (4, "title", "title_legend_of_seiman", "ur", 1),
        ];
        for (position, item_type, item_key, rarity, weight) in entries {
            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(GachaPoolEntries::Table)
                        .columns([
                            GachaPoolEntries::PoolId,
                            GachaPoolEntries::Position,
                            GachaPoolEntries::ItemType,
                            GachaPoolEntries::ItemKey,
                            GachaPoolEntries::Rarity,
                            GachaPoolEntries::Weight,
                        ])
                        .values_panic([
                            "standard".into(),
                            position.into(),
                            item_type.into(),
                            item_key.into(),
                            rarity.into(),
                            weight.into(),
                        ])
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DrawOutcomes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GachaPoolEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GachaPools::Table).to_owned())
            .await?;
        Ok(())
    }
}
