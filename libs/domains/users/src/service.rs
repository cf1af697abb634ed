use std::sync::Arc;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::error::{UserError, UserResult};
use crate::fields::models::{CreateFieldValue, FieldValue, UserFieldValue};
use crate::fields::repository::{FieldDefinitionRepository, FieldValueRepository};
use crate::fields::service::{FieldValueService, resolve_values};
use crate::models::{
    LoginRequest, NewUser, RegisterUser, UserDetails, UserResponse, normalize_email,
};
use crate::password::PasswordHasher;
use crate::repository::UserRepository;

/// Service layer for account business logic
pub struct UserService<U, D, V, H>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
    H: PasswordHasher,
{
    users: Arc<U>,
    definitions: Arc<D>,
    fields: FieldValueService<U, D, V>,
    hasher: H,
}

impl<U, D, V, H> UserService<U, D, V, H>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
    H: PasswordHasher,
{
    pub fn new(users: Arc<U>, definitions: Arc<D>, values: Arc<V>, hasher: H) -> Self {
        Self {
            fields: FieldValueService::new(users.clone(), definitions.clone(), values),
            users,
            definitions,
            hasher,
        }
    }

    /// Register an account together with its custom field values.
    ///
    /// Checks run in a fixed order: input shape, required fields, email
    /// uniqueness, password confirmation, value coercion. Nothing is written
    /// unless every check passes.
    pub async fn register(&self, input: RegisterUser) -> UserResult<UserResponse> {
        let email = input.email.trim();
        if email.is_empty() {
            return Err(UserError::InvalidInput("Email is required".into()));
        }
        if input.password.is_empty() {
            return Err(UserError::InvalidInput("Password is required".into()));
        }
        if !email.validate_email() {
            return Err(UserError::InvalidInput(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
        let email = normalize_email(email);

        let mut definitions = self.definitions.list().await?;
        definitions.sort_by_key(|d| d.id);

        let missing: Vec<String> = definitions
            .iter()
            .filter(|d| d.required)
            .filter(|d| input.custom_fields.get(&d.name).is_none_or(|v| v.is_null()))
            .map(|d| d.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(UserError::MissingRequiredFields(missing));
        }

        if self.users.email_exists(&email).await? {
            return Err(UserError::Conflict(format!(
                "User with email '{}' already exists",
                email
            )));
        }

        if input.password != input.confirm_password {
            return Err(UserError::InvalidInput("Passwords do not match".into()));
        }

        let values = resolve_values(&input.custom_fields, &definitions)?;
        let password_hash = self.hasher.hash(&input.password)?;

        let field_count = values.len();
        let user = self
            .users
            .create_with_field_values(
                NewUser {
                    email,
                    password_hash,
                },
                values,
            )
            .await?;

        tracing::info!(user_id = %user.id, field_count, "Registered user");
        Ok(user.into())
    }

    pub async fn get_user(&self, id: Uuid) -> UserResult<UserDetails> {
        let user = self
            .users
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserError::not_found("User", id))?;

        Ok(user.into())
    }

    pub async fn get_user_by_email(&self, email: &str) -> UserResult<UserDetails> {
        let email = normalize_email(email);
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or_else(|| UserError::not_found("User", &email))?;

        Ok(user.into())
    }

    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        if self.users.delete(id).await? {
            Ok(())
        } else {
            Err(UserError::not_found("User", id))
        }
    }

    /// Check credentials and record the activity.
    ///
    /// Unknown emails, inactive accounts and wrong passwords all fail the
    /// same way.
    pub async fn login(&self, input: LoginRequest) -> UserResult<UserResponse> {
        let email = normalize_email(&input.email);
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !user.is_active || !self.hasher.verify(&user.password_hash, &input.password) {
            tracing::info!(user_id = %user.id, "Rejected login");
            return Err(UserError::InvalidCredentials);
        }

        self.users.touch_last_active(user.id).await?;
        Ok(user.into())
    }

    pub async fn list_field_values(&self, user_id: Uuid) -> UserResult<Vec<UserFieldValue>> {
        self.fields.list_for_user(user_id).await
    }

    pub async fn add_field_value(
        &self,
        user_id: Uuid,
        input: CreateFieldValue,
    ) -> UserResult<FieldValue> {
        self.fields.create_value(user_id, input).await
    }
}
