use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::types::{CanonicalValue, FieldType};
use crate::error::{UserError, UserResult};

/// Administrator-defined custom field that users may fill in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldDefinition {
    pub id: i32,
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FieldDefinition {
    /// Coerces a raw value against this definition's type.
    pub fn coerce(&self, raw: &Value) -> UserResult<CanonicalValue> {
        self.field_type
            .coerce(raw)
            .map_err(|err| err.for_field(self.name.clone()))
    }

    /// The requested type, if it differs from the current one
    pub(crate) fn type_change(&self, requested: Option<FieldType>) -> Option<FieldType> {
        requested.filter(|field_type| *field_type != self.field_type)
    }

    /// Stored values are never re-coerced, so a type change needs an empty definition.
    pub(crate) fn ensure_type_change_allowed(&self, to: FieldType, stored: u64) -> UserResult<()> {
        if stored == 0 {
            return Ok(());
        }
        Err(UserError::Conflict(format!(
            "Cannot change type of '{}' from {} to {} while {} values exist",
            self.name, self.field_type, to, stored
        )))
    }

    pub(crate) fn apply_update(&mut self, input: UpdateFieldDefinition) {
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(field_type) = input.field_type {
            self.field_type = field_type;
        }
        if let Some(required) = input.required {
            self.required = required;
        }
        if let Some(description) = input.description {
            self.description = description;
        }
        self.updated_at = Utc::now();
    }
}

/// DTO for creating a field definition
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateFieldDefinition {
    #[validate(length(max = 100))]
    pub name: String,
    #[serde(alias = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// DTO for partially updating a field definition
///
/// `"description": null` clears the description; omitting it leaves it unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateFieldDefinition {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[serde(alias = "type")]
    pub field_type: Option<FieldType>,
    pub required: Option<bool>,
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

impl UpdateFieldDefinition {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.field_type.is_none()
            && self.required.is_none()
            && self.description.is_none()
    }
}

/// Distinguishes a present `null` (`Some(None)`) from an absent key (`None`).
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A stored custom field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldValue {
    pub id: i32,
    pub user_id: Uuid,
    pub field_definition_id: i32,
    /// Canonical text form of the coerced value
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// A coerced value ready to be persisted for some user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFieldValue {
    pub field_definition_id: i32,
    /// Type the value was coerced against; stores refuse it if the definition changed since
    pub field_type: FieldType,
    pub value: String,
}

impl NewFieldValue {
    pub fn new(field_definition_id: i32, value: &CanonicalValue) -> Self {
        Self {
            field_definition_id,
            field_type: value.field_type(),
            value: value.to_storage_string(),
        }
    }

    /// `Conflict` unless `definition` still has the type this value was coerced for.
    pub(crate) fn ensure_matches(&self, definition: &FieldDefinition) -> UserResult<()> {
        if definition.field_type == self.field_type {
            return Ok(());
        }
        Err(UserError::Conflict(format!(
            "Field '{}' changed type from {} to {}; retry the request",
            definition.name, self.field_type, definition.field_type
        )))
    }
}

/// DTO for attaching one value to an existing user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateFieldValue {
    pub field_definition_id: i32,
    /// Raw value; any JSON accepted by the definition's type
    #[schema(value_type = Object)]
    pub value: Value,
}

/// A user's value joined with its definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserFieldValue {
    pub field_definition_id: i32,
    pub name: String,
    pub field_type: FieldType,
    #[schema(value_type = Object)]
    pub value: Value,
}

impl UserFieldValue {
    pub fn from_parts(definition: &FieldDefinition, stored: &FieldValue) -> Self {
        // Values written before a type change are returned as plain text
        let value = definition
            .field_type
            .parse_stored(&stored.value)
            .map(|v| v.to_json())
            .unwrap_or_else(|_| Value::String(stored.value.clone()));

        Self {
            field_definition_id: definition.id,
            name: definition.name.clone(),
            field_type: definition.field_type,
            value,
        }
    }
}
