use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create credit_balances table for per-user consumable quota
        manager
            .create_table(
                Table::create()
                    .table(CreditBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditBalances::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CreditBalances::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(CreditBalances::TrainingCredits)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CreditBalances::MaxTrainingCredits)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CreditBalances::GenerationCredits)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CreditBalances::MaxGenerationCredits)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CreditBalances::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditBalances::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create unique index on user_id
        manager
            .create_index(
                Index::create()
                    .name("idx_credit_balances_user_id")
                    .table(CreditBalances::Table)
                    .col(CreditBalances::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CreditBalances::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CreditBalances {
    Table,
    Id,
    UserId,
    TrainingCredits,
    MaxTrainingCredits,
    GenerationCredits,
    MaxGenerationCredits,
    LastUpdated,
    CreatedAt,
}
