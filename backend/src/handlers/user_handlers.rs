use std::{any::Any, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use tracing::{debug, error};

use crate::{
    error::{error_body, ApiError, ServiceError},
    models::{User, UserFields},
    repositories::{DieselUserRepository, UserRepository},
    services::UserService,
};

pub type SharedUsers<R = DieselUserRepository> = Arc<UserService<R>>;

/// Repositories are blocking, so every service call runs on the blocking pool.
async fn run_blocking<R, T, F>(users: SharedUsers<R>, op: F) -> Result<T, ServiceError>
where
    R: UserRepository,
    F: FnOnce(&UserService<R>) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&users))
        .await
        .map_err(|e| ServiceError::Internal(format!("Task failed: {e}")))?
}

/// Non-integer ids behave like an unmatched route.
fn user_id(id: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    match id {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            debug!(%rejection, "rejected user id");
            Err(ServiceError::NotFound.into())
        }
    }
}

fn user_fields(payload: Result<Json<UserFields>, JsonRejection>) -> Result<UserFields, ApiError> {
    match payload {
        Ok(Json(fields)) => Ok(fields),
        Err(rejection) => Err(ApiError::MalformedBody(rejection.body_text())),
    }
}

pub async fn list_users<R: UserRepository>(
    State(users): State<SharedUsers<R>>,
) -> Result<Json<Vec<User>>, ApiError> {
    let list = run_blocking(users, |service| service.list()).await?;
    Ok(Json(list))
}

pub async fn create_user<R: UserRepository>(
    State(users): State<SharedUsers<R>>,
    payload: Result<Json<UserFields>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let fields = user_fields(payload)?;
    let user = run_blocking(users, move |service| service.create(fields)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user<R: UserRepository>(
    State(users): State<SharedUsers<R>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let id = user_id(id)?;
    let user = run_blocking(users, move |service| service.get(id)).await?;
    Ok(Json(user))
}

pub async fn update_user<R: UserRepository>(
    State(users): State<SharedUsers<R>>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UserFields>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let id = user_id(id)?;
    let fields = user_fields(payload)?;
    let user = run_blocking(users, move |service| service.update(id, fields)).await?;
    Ok(Json(user))
}

pub async fn delete_user<R: UserRepository>(
    State(users): State<SharedUsers<R>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = user_id(id)?;
    run_blocking(users, move |service| service.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn not_found() -> Response {
    error_body(StatusCode::NOT_FOUND, "Not found")
}

pub fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("request handler panicked");
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
