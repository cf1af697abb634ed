use axum::Router;
use domain_users::{
    Argon2PasswordHasher, FieldDefinitionService, PgFieldRepository, PgUserRepository,
    UserService, fields, handlers,
};
use std::sync::Arc;

pub fn router(state: &crate::state::AppState) -> Router {
    let fields = Arc::new(PgFieldRepository::new(state.db.clone()));
    let service = UserService::new(
        Arc::new(PgUserRepository::new(state.db.clone())),
        fields.clone(),
        fields,
        Argon2PasswordHasher::new(),
    );
    handlers::router(service)
}

pub fn fields_router(state: &crate::state::AppState) -> Router {
    let repository = Arc::new(PgFieldRepository::new(state.db.clone()));
    fields::handlers::router(FieldDefinitionService::new(repository))
}
