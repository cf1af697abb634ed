use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestCustomFieldResponse, BadRequestResponse, BadRequestUuidResponse,
        ConflictResponse, InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::fields::models::{CreateFieldValue, FieldValue, UserFieldValue};
use crate::fields::repository::{FieldDefinitionRepository, FieldValueRepository};
use crate::models::{LoginRequest, RegisterUser, UserDetails, UserResponse};
use crate::password::PasswordHasher;
use crate::repository::UserRepository;
use crate::service::UserService;

const TAG: &str = "users";

/// OpenAPI documentation for the account endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        register,
        login,
        get_user,
        get_user_by_email,
        delete_user,
        list_field_values,
        add_field_value,
    ),
    components(
        schemas(
            RegisterUser,
            LoginRequest,
            UserResponse,
            UserDetails,
            CreateFieldValue,
            FieldValue,
            UserFieldValue
        ),
        responses(
            BadRequestResponse,
            BadRequestCustomFieldResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            NotFoundResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Registration, lookup and custom field values")
    )
)]
pub struct ApiDoc;

type SharedService<U, D, V, H> = State<Arc<UserService<U, D, V, H>>>;

/// Create the account router
pub fn router<U, D, V, H>(service: UserService<U, D, V, H>) -> Router
where
    U: UserRepository + 'static,
    D: FieldDefinitionRepository + 'static,
    V: FieldValueRepository + 'static,
    H: PasswordHasher + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/id/{id}", get(get_user).delete(delete_user))
        .route(
            "/id/{id}/fields",
            get(list_field_values).post(add_field_value),
        )
        .route("/email/{email}", get(get_user_by_email))
        .with_state(shared_service)
}

/// Register an account with its custom field values
#[utoipa::path(
    post,
    path = "/register",
    tag = TAG,
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, response = BadRequestCustomFieldResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<U, D, V, H>(
    State(service): SharedService<U, D, V, H>,
    ValidatedJson(input): ValidatedJson<RegisterUser>,
) -> UserResult<impl IntoResponse>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
    H: PasswordHasher,
{
    let user = service.register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Verify credentials
#[utoipa::path(
    post,
    path = "/login",
    tag = TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = UserResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<U, D, V, H>(
    State(service): SharedService<U, D, V, H>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<UserResponse>>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
    H: PasswordHasher,
{
    Ok(Json(service.login(input).await?))
}

/// Get an account by id
#[utoipa::path(
    get,
    path = "/id/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Account found", body = UserDetails),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<U, D, V, H>(
    State(service): SharedService<U, D, V, H>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserDetails>>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
    H: PasswordHasher,
{
    Ok(Json(service.get_user(id).await?))
}

/// Get an account by email
#[utoipa::path(
    get,
    path = "/email/{email}",
    tag = TAG,
    params(
        ("email" = String, Path, description = "Email address, matched case-insensitively")
    ),
    responses(
        (status = 200, description = "Account found", body = UserDetails),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user_by_email<U, D, V, H>(
    State(service): SharedService<U, D, V, H>,
    Path(email): Path<String>,
) -> UserResult<Json<UserDetails>>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
    H: PasswordHasher,
{
    Ok(Json(service.get_user_by_email(&email).await?))
}

/// Delete an account and its custom field values
#[utoipa::path(
    delete,
    path = "/id/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<U, D, V, H>(
    State(service): SharedService<U, D, V, H>,
    UuidPath(id): UuidPath,
) -> UserResult<StatusCode>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
    H: PasswordHasher,
{
    service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List an account's custom field values
#[utoipa::path(
    get,
    path = "/id/{id}/fields",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Values with their definitions", body = Vec<UserFieldValue>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_field_values<U, D, V, H>(
    State(service): SharedService<U, D, V, H>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<Vec<UserFieldValue>>>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
    H: PasswordHasher,
{
    Ok(Json(service.list_field_values(id).await?))
}

/// Store one custom field value for an account
#[utoipa::path(
    post,
    path = "/id/{id}/fields",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = CreateFieldValue,
    responses(
        (status = 201, description = "Value stored", body = FieldValue),
        (status = 400, response = BadRequestCustomFieldResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_field_value<U, D, V, H>(
    State(service): SharedService<U, D, V, H>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<CreateFieldValue>,
) -> UserResult<impl IntoResponse>
where
    U: UserRepository,
    D: FieldDefinitionRepository,
    V: FieldValueRepository,
    H: PasswordHasher,
{
    let value = service.add_field_value(id, input).await?;
    Ok((StatusCode::CREATED, Json(value)))
}
