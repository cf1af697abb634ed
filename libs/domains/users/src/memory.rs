use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::fields::models::{
    CreateFieldDefinition, FieldDefinition, FieldValue, NewFieldValue, UpdateFieldDefinition,
};
use crate::fields::repository::{FieldDefinitionRepository, FieldValueRepository};
use crate::models::{NewUser, User};
use crate::repository::UserRepository;

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    definitions: BTreeMap<i32, FieldDefinition>,
    values: BTreeMap<i32, FieldValue>,
    next_definition_id: i32,
    next_value_id: i32,
}

impl State {
    fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|u| u.email == email)
    }

    fn name_taken(&self, name: &str, except: Option<i32>) -> bool {
        self.definitions
            .values()
            .any(|d| d.name == name && Some(d.id) != except)
    }

    fn value_count(&self, definition_id: i32) -> u64 {
        self.values
            .values()
            .filter(|v| v.field_definition_id == definition_id)
            .count() as u64
    }

    fn has_value(&self, user_id: Uuid, definition_id: i32) -> bool {
        self.values
            .values()
            .any(|v| v.user_id == user_id && v.field_definition_id == definition_id)
    }

    fn insert_value(&mut self, user_id: Uuid, input: NewFieldValue) -> FieldValue {
        self.next_value_id += 1;
        let value = FieldValue {
            id: self.next_value_id,
            user_id,
            field_definition_id: input.field_definition_id,
            value: input.value,
            created_at: Utc::now(),
        };
        self.values.insert(value.id, value.clone());
        value
    }
}

/// In-memory implementation of all account repositories (for development/testing)
///
/// Every operation runs under one lock over the shared state, so multi-row
/// writes are atomic. Clones share the same state.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_with_field_values(
        &self,
        user: NewUser,
        values: Vec<NewFieldValue>,
    ) -> UserResult<User> {
        let mut state = self.state.write().await;

        if state.email_taken(&user.email) {
            return Err(UserError::Conflict(format!(
                "User with email '{}' already exists",
                user.email
            )));
        }

        // Check everything before the first write
        let mut seen = HashSet::new();
        for value in &values {
            let definition = state
                .definitions
                .get(&value.field_definition_id)
                .ok_or_else(|| UserError::not_found("Field definition", value.field_definition_id))?;
            value.ensure_matches(definition)?;
            if !seen.insert(value.field_definition_id) {
                return Err(UserError::Conflict(format!(
                    "Field definition {} supplied twice",
                    value.field_definition_id
                )));
            }
        }

        let user = User::new(user);
        state.users.insert(user.id, user.clone());
        for value in values {
            state.insert_value(user.id, value);
        }

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let state = self.state.read().await;
        Ok(state.email_taken(email))
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut state = self.state.write().await;

        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.values.retain(|_, v| v.user_id != id);

        tracing::info!(user_id = %id, "Deleted user");
        Ok(true)
    }

    async fn touch_last_active(&self, id: Uuid) -> UserResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| UserError::not_found("User", id))?;

        let now = Utc::now();
        user.last_active_at = Some(now);
        user.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl FieldDefinitionRepository for InMemoryStore {
    async fn list(&self) -> UserResult<Vec<FieldDefinition>> {
        let state = self.state.read().await;
        Ok(state.definitions.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i32) -> UserResult<Option<FieldDefinition>> {
        let state = self.state.read().await;
        Ok(state.definitions.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> UserResult<Option<FieldDefinition>> {
        let state = self.state.read().await;
        Ok(state.definitions.values().find(|d| d.name == name).cloned())
    }

    async fn create(&self, input: CreateFieldDefinition) -> UserResult<FieldDefinition> {
        let mut state = self.state.write().await;

        if state.name_taken(&input.name, None) {
            return Err(UserError::Conflict(format!(
                "Field definition '{}' already exists",
                input.name
            )));
        }

        state.next_definition_id += 1;
        let now = Utc::now();
        let definition = FieldDefinition {
            id: state.next_definition_id,
            name: input.name,
            field_type: input.field_type,
            required: input.required,
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        state.definitions.insert(definition.id, definition.clone());

        tracing::info!(field_id = definition.id, name = %definition.name, "Created field definition");
        Ok(definition)
    }

    async fn update(&self, id: i32, input: UpdateFieldDefinition) -> UserResult<FieldDefinition> {
        let mut state = self.state.write().await;

        if let Some(name) = &input.name {
            if state.name_taken(name, Some(id)) {
                return Err(UserError::Conflict(format!(
                    "Field definition '{}' already exists",
                    name
                )));
            }
        }

        let current = state
            .definitions
            .get(&id)
            .ok_or_else(|| UserError::not_found("Field definition", id))?;
        if let Some(to) = current.type_change(input.field_type) {
            current.ensure_type_change_allowed(to, state.value_count(id))?;
        }

        let definition = state
            .definitions
            .get_mut(&id)
            .ok_or_else(|| UserError::not_found("Field definition", id))?;
        definition.apply_update(input);

        tracing::info!(field_id = id, "Updated field definition");
        Ok(definition.clone())
    }

    async fn delete(&self, id: i32) -> UserResult<bool> {
        let mut state = self.state.write().await;

        if state.definitions.remove(&id).is_none() {
            return Ok(false);
        }
        state.values.retain(|_, v| v.field_definition_id != id);

        tracing::info!(field_id = id, "Deleted field definition");
        Ok(true)
    }

    async fn count_values(&self, id: i32) -> UserResult<u64> {
        Ok(self.state.read().await.value_count(id))
    }
}

#[async_trait]
impl FieldValueRepository for InMemoryStore {
    async fn create(&self, user_id: Uuid, value: NewFieldValue) -> UserResult<FieldValue> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&user_id) {
            return Err(UserError::not_found("User", user_id));
        }
        let definition = state
            .definitions
            .get(&value.field_definition_id)
            .ok_or_else(|| UserError::not_found("Field definition", value.field_definition_id))?;
        value.ensure_matches(definition)?;
        if state.has_value(user_id, value.field_definition_id) {
            return Err(UserError::Conflict(format!(
                "User {} already has a value for field {}",
                user_id, value.field_definition_id
            )));
        }

        Ok(state.insert_value(user_id, value))
    }

    async fn list_for_user(&self, user_id: Uuid) -> UserResult<Vec<FieldValue>> {
        let state = self.state.read().await;
        Ok(state
            .values
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::types::{CanonicalValue, FieldType};

    fn definition(name: &str, field_type: FieldType) -> CreateFieldDefinition {
        CreateFieldDefinition {
            name: name.to_string(),
            field_type,
            required: false,
            description: None,
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    async fn seeded() -> (InMemoryStore, FieldDefinition, FieldDefinition) {
        let store = InMemoryStore::new();
        let dept = FieldDefinitionRepository::create(&store, definition("dept", FieldType::String))
            .await
            .unwrap();
        let age = FieldDefinitionRepository::create(&store, definition("age", FieldType::Integer))
            .await
            .unwrap();
        (store, dept, age)
    }

    #[tokio::test]
    async fn test_definition_ids_increase_and_list_is_ordered() {
        let (store, dept, age) = seeded().await;
        assert!(age.id > dept.id);

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["dept", "age"]);
    }

    #[tokio::test]
    async fn test_duplicate_definition_name_conflicts() {
        let (store, _, age) = seeded().await;

        let err = FieldDefinitionRepository::create(&store, definition("dept", FieldType::Text))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Conflict(_)));

        let rename = UpdateFieldDefinition {
            name: Some("dept".into()),
            ..Default::default()
        };
        let err = store.update(age.id, rename).await.unwrap_err();
        assert!(matches!(err, UserError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_refuses_type_change_once_values_exist() {
        let (store, dept, age) = seeded().await;
        store
            .create_with_field_values(
                new_user("a@example.com"),
                vec![NewFieldValue::new(dept.id, &CanonicalValue::String("abc".into()))],
            )
            .await
            .unwrap();

        let retype = |field_type| UpdateFieldDefinition {
            field_type: Some(field_type),
            ..Default::default()
        };

        let err = store.update(dept.id, retype(FieldType::Integer)).await.unwrap_err();
        assert!(matches!(err, UserError::Conflict(_)));
        let stored = FieldDefinitionRepository::get_by_id(&store, dept.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.field_type, FieldType::String);

        // Same type, or a definition without values, is fine
        let same = store.update(dept.id, retype(FieldType::String)).await.unwrap();
        assert_eq!(same.field_type, FieldType::String);
        let empty = store.update(age.id, retype(FieldType::Float)).await.unwrap();
        assert_eq!(empty.field_type, FieldType::Float);
    }

    #[tokio::test]
    async fn test_values_coerced_before_a_retype_are_refused() {
        let (store, _, age) = seeded().await;
        let stale = NewFieldValue::new(age.id, &CanonicalValue::Integer(30));

        let retype = UpdateFieldDefinition {
            field_type: Some(FieldType::Date),
            ..Default::default()
        };
        store.update(age.id, retype).await.unwrap();

        let err = store
            .create_with_field_values(new_user("late@example.com"), vec![stale.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Conflict(_)));
        assert!(store.state.read().await.users.is_empty());

        let user = store
            .create_with_field_values(new_user("early@example.com"), vec![])
            .await
            .unwrap();
        let err = FieldValueRepository::create(&store, user.id, stale)
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Conflict(_)));
        assert_eq!(store.count_values(age.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleting_definition_removes_its_values() {
        let (store, dept, age) = seeded().await;
        let user = store
            .create_with_field_values(
                new_user("a@example.com"),
                vec![
                    NewFieldValue::new(dept.id, &CanonicalValue::String("eng".into())),
                    NewFieldValue::new(age.id, &CanonicalValue::Integer(30)),
                ],
            )
            .await
            .unwrap();

        assert!(FieldDefinitionRepository::delete(&store, dept.id).await.unwrap());

        assert_eq!(store.count_values(dept.id).await.unwrap(), 0);
        let remaining = store.list_for_user(user.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].field_definition_id, age.id);

        // Nothing left pointing at a missing definition
        let state = store.state.read().await;
        assert!(
            state
                .values
                .values()
                .all(|v| state.definitions.contains_key(&v.field_definition_id))
        );
    }

    #[tokio::test]
    async fn test_deleting_user_removes_its_values() {
        let (store, dept, _) = seeded().await;
        let gone = store
            .create_with_field_values(
                new_user("gone@example.com"),
                vec![NewFieldValue::new(dept.id, &CanonicalValue::String("ops".into()))],
            )
            .await
            .unwrap();
        let kept = store
            .create_with_field_values(
                new_user("kept@example.com"),
                vec![NewFieldValue::new(dept.id, &CanonicalValue::String("eng".into()))],
            )
            .await
            .unwrap();

        assert!(UserRepository::delete(&store, gone.id).await.unwrap());
        assert!(!UserRepository::delete(&store, gone.id).await.unwrap());

        assert!(store.list_for_user(gone.id).await.unwrap().is_empty());
        assert_eq!(store.list_for_user(kept.id).await.unwrap().len(), 1);
        assert_eq!(store.count_values(dept.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_without_side_effects() {
        let (store, dept, _) = seeded().await;
        let first = store
            .create_with_field_values(
                new_user("dup@example.com"),
                vec![NewFieldValue::new(dept.id, &CanonicalValue::String("eng".into()))],
            )
            .await
            .unwrap();

        let err = store
            .create_with_field_values(
                new_user("dup@example.com"),
                vec![NewFieldValue::new(dept.id, &CanonicalValue::String("ops".into()))],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::Conflict(_)));
        assert_eq!(store.list_for_user(first.id).await.unwrap().len(), 1);
        assert_eq!(store.count_values(dept.id).await.unwrap(), 1);
        assert_eq!(store.state.read().await.users.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_definition_leaves_no_user_behind() {
        let store = InMemoryStore::new();

        let err = store
            .create_with_field_values(
                new_user("a@example.com"),
                vec![NewFieldValue::new(99, &CanonicalValue::String("x".into()))],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::NotFound { .. }));
        assert!(!store.email_exists("a@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_one_value_per_user_and_definition() {
        let (store, dept, _) = seeded().await;
        let user = store
            .create_with_field_values(new_user("a@example.com"), vec![])
            .await
            .unwrap();

        let value = NewFieldValue::new(dept.id, &CanonicalValue::String("eng".into()));
        FieldValueRepository::create(&store, user.id, value.clone())
            .await
            .unwrap();
        let err = FieldValueRepository::create(&store, user.id, value)
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_touch_last_active() {
        let store = InMemoryStore::new();
        let user = store
            .create_with_field_values(new_user("a@example.com"), vec![])
            .await
            .unwrap();
        assert!(user.last_active_at.is_none());

        store.touch_last_active(user.id).await.unwrap();

        let reloaded = UserRepository::get_by_id(&store, user.id).await.unwrap().unwrap();
        assert!(reloaded.last_active_at.is_some());
    }
}
