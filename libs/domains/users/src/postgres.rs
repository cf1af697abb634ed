use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entity::{field_definition, field_value, user};
use crate::error::{UserError, UserResult};
use crate::fields::models::{
    CreateFieldDefinition, FieldDefinition, FieldValue, NewFieldValue, UpdateFieldDefinition,
};
use crate::fields::repository::{FieldDefinitionRepository, FieldValueRepository};
use crate::models::{NewUser, User};
use crate::repository::UserRepository;

fn internal(err: DbErr) -> UserError {
    UserError::Internal(format!("Database error: {}", err))
}

/// Translates constraint violations; anything else becomes `Internal`.
fn constraint_error(err: DbErr, unique: UserError, foreign_key: Option<UserError>) -> UserError {
    match (err.sql_err(), foreign_key) {
        (Some(SqlErr::UniqueConstraintViolation(_)), _) => unique,
        (Some(SqlErr::ForeignKeyConstraintViolation(_)), Some(missing)) => missing,
        _ => internal(err),
    }
}

/// Locks the referenced definitions `FOR SHARE` until commit and checks that
/// each value was coerced against the definition's current type.
async fn lock_definitions<C: ConnectionTrait>(db: &C, values: &[NewFieldValue]) -> UserResult<()> {
    let ids: Vec<i32> = values.iter().map(|v| v.field_definition_id).collect();
    let definitions: HashMap<i32, FieldDefinition> = field_definition::Entity::find()
        .filter(field_definition::Column::Id.is_in(ids))
        .lock_shared()
        .all(db)
        .await
        .map_err(internal)?
        .into_iter()
        .map(|model| (model.id, model.into()))
        .collect();

    for value in values {
        let definition = definitions
            .get(&value.field_definition_id)
            .ok_or_else(|| UserError::not_found("Field definition", value.field_definition_id))?;
        value.ensure_matches(definition)?;
    }
    Ok(())
}

fn email_conflict(email: &str) -> UserError {
    UserError::Conflict(format!("User with email '{}' already exists", email))
}

fn name_conflict(name: &str) -> UserError {
    UserError::Conflict(format!("Field definition '{}' already exists", name))
}

pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_with_field_values(
        &self,
        input: NewUser,
        values: Vec<NewFieldValue>,
    ) -> UserResult<User> {
        let email = input.email.clone();
        let txn = self.db.begin().await.map_err(internal)?;

        let model = user::ActiveModel::from(input)
            .insert(&txn)
            .await
            .map_err(|e| constraint_error(e, email_conflict(&email), None))?;

        if !values.is_empty() {
            lock_definitions(&txn, &values).await?;

            let rows = values
                .into_iter()
                .map(|value| field_value::ActiveModel::for_user(model.id, value));

            field_value::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(|e| {
                    constraint_error(
                        e,
                        UserError::Conflict("Field supplied twice".into()),
                        Some(UserError::not_found("Field definition", "referenced by value")),
                    )
                })?;
        }

        // Dropping the transaction on an early return rolls it back
        txn.commit().await.map_err(internal)?;

        tracing::info!(user_id = %model.id, "Created user");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(internal)?;

        Ok(model.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(internal)?;

        Ok(model.map(Into::into))
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let count = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await
            .map_err(internal)?;

        Ok(count > 0)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let result = user::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(internal)?;

        if result.rows_affected > 0 {
            tracing::info!(user_id = %id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn touch_last_active(&self, id: Uuid) -> UserResult<()> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = user::Entity::update_many()
            .col_expr(user::Column::LastActiveAt, Expr::value(now))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(internal)?;

        if result.rows_affected == 0 {
            return Err(UserError::not_found("User", id));
        }
        Ok(())
    }
}

async fn count_values_on<C: ConnectionTrait>(db: &C, definition_id: i32) -> UserResult<u64> {
    field_value::Entity::find()
        .filter(field_value::Column::FieldDefinitionId.eq(definition_id))
        .count(db)
        .await
        .map_err(internal)
}

/// Field definitions and values share one connection
pub struct PgFieldRepository {
    db: DatabaseConnection,
}

impl PgFieldRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FieldDefinitionRepository for PgFieldRepository {
    async fn list(&self) -> UserResult<Vec<FieldDefinition>> {
        let models = field_definition::Entity::find()
            .order_by_asc(field_definition::Column::Id)
            .all(&self.db)
            .await
            .map_err(internal)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_by_id(&self, id: i32) -> UserResult<Option<FieldDefinition>> {
        let model = field_definition::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(internal)?;

        Ok(model.map(Into::into))
    }

    async fn get_by_name(&self, name: &str) -> UserResult<Option<FieldDefinition>> {
        let model = field_definition::Entity::find()
            .filter(field_definition::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(internal)?;

        Ok(model.map(Into::into))
    }

    async fn create(&self, input: CreateFieldDefinition) -> UserResult<FieldDefinition> {
        let name = input.name.clone();
        let model = field_definition::ActiveModel::from(input)
            .insert(&self.db)
            .await
            .map_err(|e| constraint_error(e, name_conflict(&name), None))?;

        tracing::info!(field_id = model.id, name = %model.name, "Created field definition");
        Ok(model.into())
    }

    async fn update(&self, id: i32, input: UpdateFieldDefinition) -> UserResult<FieldDefinition> {
        let txn = self.db.begin().await.map_err(internal)?;

        // FOR UPDATE blocks value inserts, whose FK check takes a key-share lock on this row
        let model = field_definition::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(internal)?
            .ok_or_else(|| UserError::not_found("Field definition", id))?;

        let current = FieldDefinition::from(model.clone());
        if let Some(to) = current.type_change(input.field_type) {
            current.ensure_type_change_allowed(to, count_values_on(&txn, id).await?)?;
        }

        let mut active = model.into_active_model();
        let name = input.name.clone();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(field_type) = input.field_type {
            active.field_type = Set(field_type);
        }
        if let Some(required) = input.required {
            active.required = Set(required);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await.map_err(|e| {
            constraint_error(e, name_conflict(name.as_deref().unwrap_or_default()), None)
        })?;
        txn.commit().await.map_err(internal)?;

        tracing::info!(field_id = id, "Updated field definition");
        Ok(updated.into())
    }

    async fn delete(&self, id: i32) -> UserResult<bool> {
        let result = field_definition::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(internal)?;

        if result.rows_affected > 0 {
            tracing::info!(field_id = id, "Deleted field definition");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn count_values(&self, id: i32) -> UserResult<u64> {
        count_values_on(&self.db, id).await
    }
}

#[async_trait]
impl FieldValueRepository for PgFieldRepository {
    async fn create(&self, user_id: Uuid, value: NewFieldValue) -> UserResult<FieldValue> {
        let definition_id = value.field_definition_id;
        let txn = self.db.begin().await.map_err(internal)?;

        lock_definitions(&txn, std::slice::from_ref(&value)).await?;

        let model = field_value::ActiveModel::for_user(user_id, value)
            .insert(&txn)
            .await
            .map_err(|e| {
                constraint_error(
                    e,
                    UserError::Conflict(format!(
                        "User {} already has a value for field {}",
                        user_id, definition_id
                    )),
                    Some(UserError::not_found(
                        "User or field definition",
                        format!("{}/{}", user_id, definition_id),
                    )),
                )
            })?;
        txn.commit().await.map_err(internal)?;

        tracing::debug!(user_id = %user_id, field_id = definition_id, "Stored field value");
        Ok(model.into())
    }

    async fn list_for_user(&self, user_id: Uuid) -> UserResult<Vec<FieldValue>> {
        let models = field_value::Entity::find()
            .filter(field_value::Column::UserId.eq(user_id))
            .order_by_asc(field_value::Column::FieldDefinitionId)
            .all(&self.db)
            .await
            .map_err(internal)?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::types::FieldType;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn definition_model(id: i32, name: &str) -> field_definition::Model {
        let now = Utc::now().into();
        field_definition::Model {
            id,
            name: name.to_string(),
            field_type: FieldType::Date,
            required: true,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_maps_models() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                definition_model(1, "birthdate"),
                definition_model(2, "hired_on"),
            ]])
            .into_connection();
        let repo = PgFieldRepository::new(db);

        let definitions = repo.list().await.unwrap();
        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[0].name, "birthdate");
        assert_eq!(definitions[1].field_type, FieldType::Date);
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let repo = PgUserRepository::new(db);

        assert!(!repo.delete(Uuid::now_v7()).await.unwrap());
    }

    #[tokio::test]
    async fn test_touch_last_active_missing_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let err = repo.touch_last_active(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound { entity: "User", .. }));
    }

    #[tokio::test]
    async fn test_query_errors_become_internal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("boom".into())])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let err = repo.get_by_email("a@example.com").await.unwrap_err();
        assert!(matches!(err, UserError::Internal(_)));
    }
}
