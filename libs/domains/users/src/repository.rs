use async_trait::async_trait;
use uuid::Uuid;

use crate::error::UserResult;
use crate::fields::models::NewFieldValue;
use crate::models::{NewUser, User};

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user and its field values as one atomic unit.
    ///
    /// A taken email is `Conflict`; on any error nothing is stored.
    async fn create_with_field_values(
        &self,
        user: NewUser,
        values: Vec<NewFieldValue>,
    ) -> UserResult<User>;

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Lookup by an already normalized email
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    async fn email_exists(&self, email: &str) -> UserResult<bool>;

    /// Delete a user and its field values
    async fn delete(&self, id: Uuid) -> UserResult<bool>;

    /// Record a successful login
    async fn touch_last_active(&self, id: Uuid) -> UserResult<()>;
}
