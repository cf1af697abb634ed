use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::models::{
    CreateFieldDefinition, CreateFieldValue, FieldDefinition, FieldValue, NewFieldValue,
    UpdateFieldDefinition, UserFieldValue,
};
use super::repository::{FieldDefinitionRepository, FieldValueRepository};
use crate::error::{UserError, UserResult};
use crate::repository::UserRepository;

/// Administration of custom field definitions
pub struct FieldDefinitionService<D: FieldDefinitionRepository> {
    definitions: Arc<D>,
}

impl<D: FieldDefinitionRepository> FieldDefinitionService<D> {
    pub fn new(definitions: Arc<D>) -> Self {
        Self { definitions }
    }

    pub async fn list(&self) -> UserResult<Vec<FieldDefinition>> {
        self.definitions.list().await
    }

    pub async fn get(&self, id: i32) -> UserResult<FieldDefinition> {
        self.definitions
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserError::not_found("Field definition", id))
    }

    pub async fn create(&self, mut input: CreateFieldDefinition) -> UserResult<FieldDefinition> {
        input.name = trimmed_name(&input.name)?;

        if self.definitions.get_by_name(&input.name).await?.is_some() {
            return Err(UserError::Conflict(format!(
                "Field definition '{}' already exists",
                input.name
            )));
        }

        self.definitions.create(input).await
    }

    pub async fn update(
        &self,
        id: i32,
        mut input: UpdateFieldDefinition,
    ) -> UserResult<FieldDefinition> {
        if input.is_empty() {
            return Err(UserError::InvalidInput(
                "At least one field must be provided".into(),
            ));
        }

        self.get(id).await?;

        if let Some(name) = input.name.as_deref() {
            let name = trimmed_name(name)?;
            if let Some(other) = self.definitions.get_by_name(&name).await? {
                if other.id != id {
                    return Err(UserError::Conflict(format!(
                        "Field definition '{}' already exists",
                        name
                    )));
                }
            }
            input.name = Some(name);
        }

        // Type changes are checked against stored values by the repository
        self.definitions.update(id, input).await
    }

    pub async fn delete(&self, id: i32) -> UserResult<()> {
        if self.definitions.delete(id).await? {
            Ok(())
        } else {
            Err(UserError::not_found("Field definition", id))
        }
    }
}

fn trimmed_name(name: &str) -> UserResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UserError::InvalidInput(
            "Field name must not be empty".into(),
        ));
    }
    Ok(name.to_string())
}

/// Matches supplied values to definitions by name and coerces them.
///
/// Unknown names are dropped; `null` for an optional field is skipped. The
/// first value that fails coercion aborts with `InvalidFieldValue`.
pub fn resolve_values(
    custom_fields: &HashMap<String, Value>,
    definitions: &[FieldDefinition],
) -> UserResult<Vec<NewFieldValue>> {
    let by_name: HashMap<&str, &FieldDefinition> =
        definitions.iter().map(|d| (d.name.as_str(), d)).collect();

    let mut resolved = Vec::with_capacity(custom_fields.len());
    for (name, raw) in custom_fields {
        let Some(definition) = by_name.get(name.as_str()) else {
            tracing::debug!(field = %name, "Ignoring unknown custom field");
            continue;
        };

        if raw.is_null() && !definition.required {
            continue;
        }

        let value = definition.coerce(raw)?;
        resolved.push(NewFieldValue::new(definition.id, &value));
    }

    resolved.sort_by_key(|v| v.field_definition_id);
    Ok(resolved)
}

/// Custom field values of existing users
pub struct FieldValueService<U, D, V>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
{
    users: Arc<U>,
    definitions: Arc<D>,
    values: Arc<V>,
}

impl<U, D, V> FieldValueService<U, D, V>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
{
    pub fn new(users: Arc<U>, definitions: Arc<D>, values: Arc<V>) -> Self {
        Self {
            users,
            definitions,
            values,
        }
    }

    /// Validate and store one value for one user
    pub async fn create_value(
        &self,
        user_id: Uuid,
        input: CreateFieldValue,
    ) -> UserResult<FieldValue> {
        let definition = self
            .definitions
            .get_by_id(input.field_definition_id)
            .await?
            .ok_or_else(|| UserError::not_found("Field definition", input.field_definition_id))?;

        if self.users.get_by_id(user_id).await?.is_none() {
            return Err(UserError::not_found("User", user_id));
        }

        let value = definition.coerce(&input.value)?;
        let stored = self
            .values
            .create(user_id, NewFieldValue::new(definition.id, &value))
            .await?;

        tracing::info!(user_id = %user_id, field = %definition.name, "Stored custom field value");
        Ok(stored)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> UserResult<Vec<UserFieldValue>> {
        if self.users.get_by_id(user_id).await?.is_none() {
            return Err(UserError::not_found("User", user_id));
        }

        let definitions: HashMap<i32, FieldDefinition> = self
            .definitions
            .list()
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        let values = self.values.list_for_user(user_id).await?;
        Ok(values
            .iter()
            .filter_map(|v| {
                definitions
                    .get(&v.field_definition_id)
                    .map(|d| UserFieldValue::from_parts(d, v))
            })
            .collect())
    }
}
