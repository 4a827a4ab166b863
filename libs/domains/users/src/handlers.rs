use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use axum_helpers::{
    UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
        UnprocessableEntityResponse,
    },
};
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{
    ChangePassword, CreateUser, IdResponse, MessageResponse, UpdateUser, UserResponse,
};
use crate::password::PasswordHasher;
use crate::repository::UserRepository;
use crate::service::UserService;

pub const USER_CREATED: &str = "User created successfully";
pub const PASSWORD_UPDATED: &str = "Password updated successfully";
pub const CREATE_FAILED: &str = "Failed to create user";
pub const UPDATE_FAILED: &str = "Failed to update user";
pub const DELETE_FAILED: &str = "Failed to delete user";
pub const UNKNOWN_USER: &str = "Unknown user";

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        get_user,
        update_user,
        delete_user,
        change_password,
    ),
    components(
        schemas(
            UserResponse,
            CreateUser,
            UpdateUser,
            ChangePassword,
            MessageResponse,
            IdResponse
        ),
        responses(
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            UnprocessableEntityResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "User accounts and password management")
    )
)]
pub struct ApiDoc;

type SharedService<R, H> = State<UserService<R, H>>;

/// Create the users router with all HTTP endpoints
pub fn router<R, H>(service: UserService<R, H>) -> Router
where
    R: UserRepository + 'static,
    H: PasswordHasher,
{
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/change-password", patch(change_password))
        .with_state(service)
}

/// List all users
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    responses(
        (status = 200, description = "All users, oldest first", body = Vec<UserResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository, H: PasswordHasher>(
    State(service): SharedService<R, H>,
) -> UserResult<Json<Vec<UserResponse>>> {
    let users = service.get_users().await?;
    Ok(Json(users))
}

/// Create a user
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<R: UserRepository, H: PasswordHasher>(
    State(service): SharedService<R, H>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<impl IntoResponse> {
    service
        .create_user(input)
        .await
        .map_err(|e| e.or_unprocessable(CREATE_FAILED))?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new(USER_CREATED))))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<R: UserRepository, H: PasswordHasher>(
    State(service): SharedService<R, H>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    service
        .get_user(id)
        .await?
        .map(Json)
        .ok_or(UserError::Unprocessable(UNKNOWN_USER))
}

/// Update a user's name and email
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = IdResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<R: UserRepository, H: PasswordHasher>(
    State(service): SharedService<R, H>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> UserResult<Json<IdResponse>> {
    service
        .update_user(id, input)
        .await
        .map_err(|e| e.or_unprocessable(UPDATE_FAILED))?;

    Ok(Json(IdResponse { id }))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = IdResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository, H: PasswordHasher>(
    State(service): SharedService<R, H>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<IdResponse>> {
    service
        .delete_user(id)
        .await
        .map_err(|e| e.or_unprocessable(DELETE_FAILED))?;

    Ok(Json(IdResponse { id }))
}

/// Change a user's password
///
/// The old password must verify against the stored digest and the new password
/// must be repeated exactly in `confirm_new_password`.
#[utoipa::path(
    patch,
    path = "/{id}/change-password",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn change_password<R: UserRepository, H: PasswordHasher>(
    State(service): SharedService<R, H>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<ChangePassword>,
) -> UserResult<Json<MessageResponse>> {
    service.change_password(id, input).await?;
    Ok(Json(MessageResponse::new(PASSWORD_UPDATED)))
}
