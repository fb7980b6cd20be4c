use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create training_jobs table for remote fine-tuning run records
        manager
            .create_table(
                Table::create()
                    .table(TrainingJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrainingJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TrainingJobs::UserId).uuid().not_null())
                    .col(ColumnDef::new(TrainingJobs::ModelName).string().not_null())
                    .col(ColumnDef::new(TrainingJobs::ModelId).string().not_null())
                    .col(
                        ColumnDef::new(TrainingJobs::ExternalJobId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingJobs::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(TrainingJobs::TriggerWord)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingJobs::TrainingSteps)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrainingJobs::Gender).string().null())
                    .col(
                        ColumnDef::new(TrainingJobs::ArchiveName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrainingJobs::UserEmail).string().not_null())
                    .col(
                        ColumnDef::new(TrainingJobs::UserDisplayName)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(TrainingJobs::TrainedVersion).string().null())
                    .col(
                        ColumnDef::new(TrainingJobs::TrainingDuration)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TrainingJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingJobs::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Durable identity key: one job per (user_id, model_name).
        // Changing this requires a migration (webhook routing depends on it).
        manager
            .create_index(
                Index::create()
                    .name("idx_training_jobs_user_model")
                    .table(TrainingJobs::Table)
                    .col(TrainingJobs::UserId)
                    .col(TrainingJobs::ModelName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Provider-side correlation key
        manager
            .create_index(
                Index::create()
                    .name("idx_training_jobs_external_job_id")
                    .table(TrainingJobs::Table)
                    .col(TrainingJobs::ExternalJobId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Sweep scans live jobs by status and age
        manager
            .create_index(
                Index::create()
                    .name("idx_training_jobs_status_created_at")
                    .table(TrainingJobs::Table)
                    .col(TrainingJobs::Status)
                    .col(TrainingJobs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TrainingJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TrainingJobs {
    Table,
    Id,
    UserId,
    ModelName,
    ModelId,
    ExternalJobId,
    Status,
    TriggerWord,
    TrainingSteps,
    Gender,
    ArchiveName,
    UserEmail,
    UserDisplayName,
    TrainedVersion,
    TrainingDuration,
    CreatedAt,
    CompletedAt,
}
