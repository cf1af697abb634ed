use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserFieldDefinitions::Table)
                    .if_not_exists()
                    .col(pk_auto(UserFieldDefinitions::Id))
                    .col(
                        ColumnDef::new(UserFieldDefinitions::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(text(UserFieldDefinitions::FieldType).default("string"))
                    .col(boolean(UserFieldDefinitions::Required).default(false))
                    .col(text_null(UserFieldDefinitions::Description))
                    .col(
                        timestamp_with_time_zone(UserFieldDefinitions::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(UserFieldDefinitions::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserFieldDefinitions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum UserFieldDefinitions {
    Table,
    Id,
    Name,
    FieldType,
    Required,
    Description,
    CreatedAt,
    UpdatedAt,
}
