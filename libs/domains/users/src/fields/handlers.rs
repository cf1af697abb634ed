use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    IdPath, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use super::models::{CreateFieldDefinition, FieldDefinition, UpdateFieldDefinition};
use super::repository::FieldDefinitionRepository;
use super::service::FieldDefinitionService;
use super::types::FieldType;
use crate::error::UserResult;

const TAG: &str = "user-fields";

/// OpenAPI documentation for the field definition endpoints
#[derive(OpenApi)]
#[openapi(
    paths(list_fields, create_field, get_field, update_field, delete_field),
    components(
        schemas(FieldDefinition, CreateFieldDefinition, UpdateFieldDefinition, FieldType),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Custom field definitions for user accounts")
    )
)]
pub struct ApiDoc;

/// Create the field definition router
pub fn router<D: FieldDefinitionRepository + 'static>(service: FieldDefinitionService<D>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_fields).post(create_field))
        .route(
            "/{id}",
            get(get_field).patch(update_field).delete(delete_field),
        )
        .with_state(shared_service)
}

/// List all field definitions
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    responses(
        (status = 200, description = "Field definitions ordered by id", body = Vec<FieldDefinition>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_fields<D: FieldDefinitionRepository>(
    State(service): State<Arc<FieldDefinitionService<D>>>,
) -> UserResult<Json<Vec<FieldDefinition>>> {
    Ok(Json(service.list().await?))
}

/// Create a field definition
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateFieldDefinition,
    responses(
        (status = 201, description = "Field definition created", body = FieldDefinition),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_field<D: FieldDefinitionRepository>(
    State(service): State<Arc<FieldDefinitionService<D>>>,
    ValidatedJson(input): ValidatedJson<CreateFieldDefinition>,
) -> UserResult<impl IntoResponse> {
    let definition = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(definition)))
}

/// Get a field definition by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Field definition id")
    ),
    responses(
        (status = 200, description = "Field definition found", body = FieldDefinition),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_field<D: FieldDefinitionRepository>(
    State(service): State<Arc<FieldDefinitionService<D>>>,
    IdPath(id): IdPath,
) -> UserResult<Json<FieldDefinition>> {
    Ok(Json(service.get(id).await?))
}

/// Update some attributes of a field definition
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Field definition id")
    ),
    request_body = UpdateFieldDefinition,
    responses(
        (status = 200, description = "Field definition updated", body = FieldDefinition),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_field<D: FieldDefinitionRepository>(
    State(service): State<Arc<FieldDefinitionService<D>>>,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateFieldDefinition>,
) -> UserResult<Json<FieldDefinition>> {
    Ok(Json(service.update(id, input).await?))
}

/// Delete a field definition and every value stored for it
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Field definition id")
    ),
    responses(
        (status = 204, description = "Field definition deleted"),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_field<D: FieldDefinitionRepository>(
    State(service): State<Arc<FieldDefinitionService<D>>>,
    IdPath(id): IdPath,
) -> UserResult<StatusCode> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
