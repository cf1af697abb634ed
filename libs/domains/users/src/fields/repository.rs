use async_trait::async_trait;
use uuid::Uuid;

use super::models::{
    CreateFieldDefinition, FieldDefinition, FieldValue, NewFieldValue, UpdateFieldDefinition,
};
use crate::error::UserResult;

/// Repository trait for custom field definitions
///
/// Implementations enforce unique names and cascade deletes to stored values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FieldDefinitionRepository: Send + Sync {
    /// All definitions, ordered by id
    async fn list(&self) -> UserResult<Vec<FieldDefinition>>;

    async fn get_by_id(&self, id: i32) -> UserResult<Option<FieldDefinition>>;

    async fn get_by_name(&self, name: &str) -> UserResult<Option<FieldDefinition>>;

    /// Insert a definition; a taken name is `Conflict`
    async fn create(&self, input: CreateFieldDefinition) -> UserResult<FieldDefinition>;

    /// Apply a partial update; a missing id is `NotFound`
    ///
    /// Changing `field_type` while values reference the definition is `Conflict`.
    /// The check and the write form one unit, so no value can be stored in between.
    async fn update(&self, id: i32, input: UpdateFieldDefinition) -> UserResult<FieldDefinition>;

    /// Delete a definition and its values
    async fn delete(&self, id: i32) -> UserResult<bool>;

    /// Number of stored values that reference the definition
    async fn count_values(&self, id: i32) -> UserResult<u64>;
}

/// Repository trait for stored custom field values
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FieldValueRepository: Send + Sync {
    /// Insert one value; a second value for the same (user, definition) is `Conflict`
    async fn create(&self, user_id: Uuid, value: NewFieldValue) -> UserResult<FieldValue>;

    async fn list_for_user(&self, user_id: Uuid) -> UserResult<Vec<FieldValue>>;
}
