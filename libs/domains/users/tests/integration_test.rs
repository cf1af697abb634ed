//! Integration tests for the users domain
//!
//! These tests use real PostgreSQL via testcontainers to ensure:
//! - Unique constraints surface as conflicts
//! - Foreign keys cascade on delete
//! - Registration is atomic
//! - Stored text re-coerces to the same values

use domain_users::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};

struct Fixture {
    _db: TestDatabase,
    users: Arc<PgUserRepository>,
    fields: Arc<PgFieldRepository>,
}

impl Fixture {
    async fn new() -> Self {
        let db = TestDatabase::new().await;
        Self {
            users: Arc::new(PgUserRepository::new(db.connection())),
            fields: Arc::new(PgFieldRepository::new(db.connection())),
            _db: db,
        }
    }

    fn service(
        &self,
    ) -> UserService<PgUserRepository, PgFieldRepository, PgFieldRepository, Argon2PasswordHasher>
    {
        UserService::new(
            self.users.clone(),
            self.fields.clone(),
            self.fields.clone(),
            Argon2PasswordHasher::new(),
        )
    }

    fn definitions(&self) -> FieldDefinitionService<PgFieldRepository> {
        FieldDefinitionService::new(self.fields.clone())
    }
}

fn create(name: &str, field_type: FieldType, required: bool) -> CreateFieldDefinition {
    CreateFieldDefinition {
        name: name.to_string(),
        field_type,
        required,
        description: None,
    }
}

fn register(email: &str, custom_fields: serde_json::Value) -> RegisterUser {
    RegisterUser {
        email: email.to_string(),
        password: "s3cret-pass".to_string(),
        confirm_password: "s3cret-pass".to_string(),
        custom_fields: serde_json::from_value::<HashMap<_, _>>(custom_fields).unwrap(),
    }
}

// ============================================================================
// Field definition tests
// ============================================================================

#[tokio::test]
async fn test_create_and_get_definition() {
    let fx = Fixture::new().await;
    let builder = TestDataBuilder::from_test_name("create_and_get_definition");
    let name = builder.name("field", "dept");

    let created = fx
        .definitions()
        .create(create(&name, FieldType::Integer, true))
        .await
        .unwrap();
    assert_eq!(created.field_type, FieldType::Integer);

    let by_name = fx.fields.get_by_name(&name).await.unwrap();
    let by_name = assert_some(by_name, "definition by name");
    assert_eq!(by_name.id, created.id);

    let listed = fx.definitions().list().await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_duplicate_definition_name_conflicts_in_database() {
    let fx = Fixture::new().await;

    FieldDefinitionRepository::create(fx.fields.as_ref(), create("dept", FieldType::String, false))
        .await
        .unwrap();
    // Straight to the repository so the unique index is what rejects it
    let err = FieldDefinitionRepository::create(
        fx.fields.as_ref(),
        create("dept", FieldType::Text, false),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, UserError::Conflict(_)));
}

#[tokio::test]
async fn test_update_definition_clears_description() {
    let fx = Fixture::new().await;
    let mut input = create("dept", FieldType::String, false);
    input.description = Some("Department".into());
    let created = fx.definitions().create(input).await.unwrap();

    let updated = fx
        .definitions()
        .update(
            created.id,
            UpdateFieldDefinition {
                name: Some(" department ".into()),
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "department");
    assert_eq!(updated.description, None);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_type_change_rejected_once_values_exist() {
    let fx = Fixture::new().await;
    let builder = TestDataBuilder::from_test_name("type_change_rejected");
    let dept = fx
        .definitions()
        .create(create("dept", FieldType::String, false))
        .await
        .unwrap();
    fx.service()
        .register(register(&builder.email("ada"), json!({ "dept": "abc" })))
        .await
        .unwrap();

    let retype = UpdateFieldDefinition {
        field_type: Some(FieldType::Integer),
        ..Default::default()
    };
    let err = fx.fields.update(dept.id, retype).await.unwrap_err();
    assert!(matches!(err, UserError::Conflict(_)));

    let stored = assert_some(fx.fields.get_by_id(dept.id).await.unwrap(), "definition");
    assert_eq!(stored.field_type, FieldType::String);
}

#[tokio::test]
async fn test_concurrent_retype_and_registration_stay_consistent() {
    let fx = Fixture::new().await;
    let builder = TestDataBuilder::from_test_name("concurrent_retype");
    let dept = fx
        .definitions()
        .create(create("dept", FieldType::String, false))
        .await
        .unwrap();

    let service = fx.service();
    let registration = service.register(register(&builder.email("ada"), json!({ "dept": "abc" })));
    let retype = fx.fields.update(
        dept.id,
        UpdateFieldDefinition {
            field_type: Some(FieldType::Integer),
            ..Default::default()
        },
    );
    let (registered, retyped) = tokio::join!(registration, retype);

    // Exactly one wins; a value never ends up under a type it was not coerced for
    let definition = assert_some(fx.fields.get_by_id(dept.id).await.unwrap(), "definition");
    let stored = fx.fields.count_values(dept.id).await.unwrap();
    if retyped.is_ok() {
        assert_eq!(definition.field_type, FieldType::Integer);
        assert_eq!(stored, 0);
    } else {
        assert!(registered.is_ok());
        assert_eq!(definition.field_type, FieldType::String);
        assert_eq!(stored, 1);
    }
}

// ============================================================================
// Registration tests
// ============================================================================

#[tokio::test]
async fn test_register_persists_user_and_values() {
    let fx = Fixture::new().await;
    let builder = TestDataBuilder::from_test_name("register_persists");
    let definitions = fx.definitions();
    definitions
        .create(create("dept", FieldType::String, true))
        .await
        .unwrap();
    definitions
        .create(create("hired", FieldType::DateTime, false))
        .await
        .unwrap();
    definitions
        .create(create("meta", FieldType::Json, false))
        .await
        .unwrap();

    let email = builder.email("grace");
    let created = fx
        .service()
        .register(register(
            &email,
            json!({
                "dept": "eng",
                "hired": "2024-01-15T12:00:00+02:00",
                "meta": { "floor": 3 }
            }),
        ))
        .await
        .unwrap();

    let user = assert_some(fx.users.get_by_id(created.id).await.unwrap(), "user");
    assert_uuid_eq(user.id, created.id, "stored user id");
    assert_eq!(user.email, email);
    assert!(user.password_hash.starts_with("$argon2"));

    let values = fx.service().list_field_values(created.id).await.unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[1].value, json!("2024-01-15T10:00:00Z"));
    assert_eq!(values[2].value, json!({ "floor": 3 }));
}

#[tokio::test]
async fn test_duplicate_registration_leaves_no_extra_values() {
    let fx = Fixture::new().await;
    let dept = fx
        .definitions()
        .create(create("dept", FieldType::String, true))
        .await
        .unwrap();

    let first = fx
        .service()
        .register(register("dup@example.com", json!({ "dept": "eng" })))
        .await
        .unwrap();
    let err = fx
        .service()
        .register(register("dup@example.com", json!({ "dept": "ops" })))
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::Conflict(_)));
    assert_eq!(fx.fields.list_for_user(first.id).await.unwrap().len(), 1);
    assert_eq!(fx.fields.count_values(dept.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_email_unique_index_rolls_back_values() {
    let fx = Fixture::new().await;
    let dept = fx
        .definitions()
        .create(create("dept", FieldType::String, false))
        .await
        .unwrap();

    let value = NewFieldValue::new(dept.id, &CanonicalValue::String("eng".into()));
    let user = NewUser {
        email: "race@example.com".into(),
        password_hash: "hash".into(),
    };

    fx.users
        .create_with_field_values(user.clone(), vec![value.clone()])
        .await
        .unwrap();
    let err = fx
        .users
        .create_with_field_values(user, vec![value])
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::Conflict(_)));
    assert_eq!(fx.fields.count_values(dept.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_definition_id_rolls_back_user() {
    let fx = Fixture::new().await;

    let err = fx
        .users
        .create_with_field_values(
            NewUser {
                email: "orphan@example.com".into(),
                password_hash: "hash".into(),
            },
            vec![NewFieldValue::new(404, &CanonicalValue::String("x".into()))],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::NotFound { .. }));
    assert!(!fx.users.email_exists("orphan@example.com").await.unwrap());
}

// ============================================================================
// Cascade tests
// ============================================================================

#[tokio::test]
async fn test_deleting_definition_cascades_to_values() {
    let fx = Fixture::new().await;
    let dept = fx
        .definitions()
        .create(create("dept", FieldType::String, false))
        .await
        .unwrap();
    let created = fx
        .service()
        .register(register("a@example.com", json!({ "dept": "eng" })))
        .await
        .unwrap();

    fx.definitions().delete(dept.id).await.unwrap();

    assert_eq!(fx.fields.count_values(dept.id).await.unwrap(), 0);
    assert!(fx.fields.list_for_user(created.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_user_cascades_to_values() {
    let fx = Fixture::new().await;
    let dept = fx
        .definitions()
        .create(create("dept", FieldType::String, false))
        .await
        .unwrap();
    let created = fx
        .service()
        .register(register("a@example.com", json!({ "dept": "eng" })))
        .await
        .unwrap();

    fx.service().delete_user(created.id).await.unwrap();

    assert_eq!(fx.fields.count_values(dept.id).await.unwrap(), 0);
    assert!(fx.users.get_by_id(created.id).await.unwrap().is_none());
}

// ============================================================================
// Value tests
// ============================================================================

#[tokio::test]
async fn test_stored_values_round_trip() {
    let fx = Fixture::new().await;
    let cases = [
        ("flag", FieldType::Boolean, json!("TRUE")),
        ("born", FieldType::Date, json!("2024-01-15")),
        ("score", FieldType::Float, json!(2.5)),
        ("count", FieldType::Integer, json!(" 12 ")),
    ];

    let mut ids = Vec::new();
    for (name, field_type, _) in &cases {
        let created = fx
            .definitions()
            .create(create(name, *field_type, false))
            .await
            .unwrap();
        ids.push(created.id);
    }

    let user = fx
        .service()
        .register(register("a@example.com", json!({})))
        .await
        .unwrap();

    for ((_, field_type, raw), id) in cases.iter().zip(&ids) {
        let stored = fx
            .service()
            .add_field_value(
                user.id,
                CreateFieldValue {
                    field_definition_id: *id,
                    value: raw.clone(),
                },
            )
            .await
            .unwrap();

        let original = field_type.coerce(raw).unwrap();
        assert_eq!(field_type.parse_stored(&stored.value).unwrap(), original);
    }

    let err = fx
        .service()
        .add_field_value(
            user.id,
            CreateFieldValue {
                field_definition_id: ids[0],
                value: json!(false),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::Conflict(_)));
}

#[tokio::test]
async fn test_login_updates_last_active() {
    let fx = Fixture::new().await;
    let created = fx
        .service()
        .register(register("login@example.com", json!({})))
        .await
        .unwrap();

    fx.service()
        .login(LoginRequest {
            email: "LOGIN@example.com".into(),
            password: "s3cret-pass".into(),
        })
        .await
        .unwrap();

    let user = assert_some(fx.users.get_by_id(created.id).await.unwrap(), "user");
    assert!(user.last_active_at.is_some());
}
