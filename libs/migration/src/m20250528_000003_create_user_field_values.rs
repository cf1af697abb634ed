use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250528_000001_create_users::Users;
use crate::m20250528_000002_create_user_field_definitions::UserFieldDefinitions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserFieldValues::Table)
                    .if_not_exists()
                    .col(pk_auto(UserFieldValues::Id))
                    .col(uuid(UserFieldValues::UserId))
                    .col(integer(UserFieldValues::FieldDefinitionId))
                    .col(text(UserFieldValues::Value))
                    .col(
                        timestamp_with_time_zone(UserFieldValues::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_field_values_user")
                            .from(UserFieldValues::Table, UserFieldValues::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_field_values_definition")
                            .from(UserFieldValues::Table, UserFieldValues::FieldDefinitionId)
                            .to(UserFieldDefinitions::Table, UserFieldDefinitions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One value per (user, definition)
        manager
            .create_index(
                Index::create()
                    .name("uq_user_field_values_user_definition")
                    .table(UserFieldValues::Table)
                    .col(UserFieldValues::UserId)
                    .col(UserFieldValues::FieldDefinitionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_field_values_definition")
                    .table(UserFieldValues::Table)
                    .col(UserFieldValues::FieldDefinitionId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserFieldValues::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserFieldValues {
    Table,
    Id,
    UserId,
    FieldDefinitionId,
    Value,
    CreatedAt,
}
