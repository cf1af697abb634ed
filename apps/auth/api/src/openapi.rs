use utoipa::OpenApi;

/// OpenAPI document for the whole service, served by `create_router`
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Auth API",
        description = "User accounts with administrator-defined custom fields"
    ),
    nest(
        (path = "/api/user", api = domain_users::handlers::ApiDoc),
        (path = "/api/user-field", api = domain_users::fields::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
