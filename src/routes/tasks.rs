use crate::{
    auth::AuthenticatedUser,
    db,
    error::{AppError, ErrorResponse},
    models::{Task, TaskCreate, TaskListResponse, TaskQuery, TaskUpdate},
    repository::TaskRepository,
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Creates a task owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: 1-255 characters, not blank. Stored trimmed.
///
/// ## Responses:
/// - `201 Created`: the new task, `completed` is `false`.
/// - `401 Unauthorized`: missing, invalid or expired token.
/// - `422 Unprocessable Entity`: invalid title.
#[utoipa::path(
    post,
    path = "/api/todos",
    tag = "todos",
    security(("bearer_auth" = [])),
    request_body = TaskCreate,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 422, description = "Invalid title", body = ErrorResponse)
    )
)]
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_data: web::Json<TaskCreate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let mut tx = db::begin(&pool).await?;
    let task = TaskRepository::create(&mut tx, user.id, task_data.normalized_title()).await?;
    tx.commit().await?;

    log::info!("User {} created task {}", user.id, task.id);
    Ok(HttpResponse::Created().json(task))
}

/// Lists the authenticated user's tasks, newest first.
///
/// ## Query Parameters:
/// - `completed` (optional): only tasks in this state.
/// - `limit` (optional, default 100, 1-100) and `offset` (optional, default 0).
///
/// ## Responses:
/// - `200 OK`: `{ items, total, limit, offset }`. `total` counts every matching task.
#[utoipa::path(
    get,
    path = "/api/todos",
    tag = "todos",
    security(("bearer_auth" = [])),
    params(TaskQuery),
    responses(
        (status = 200, description = "A page of the caller's tasks", body = TaskListResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse)
    )
)]
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    query.validate()?;

    let mut tx = db::begin(&pool).await?;
    let total = TaskRepository::count(&mut tx, user.id, query.completed).await?;
    let items =
        TaskRepository::list(&mut tx, user.id, query.completed, query.limit, query.offset).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(TaskListResponse {
        items,
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// Fetches one task. A task owned by someone else is reported as `404`, like a
/// missing one.
#[utoipa::path(
    get,
    path = "/api/todos/{id}",
    tag = "todos",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = Task),
        (status = 404, description = "No such task for this user", body = ErrorResponse)
    )
)]
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let mut tx = db::begin(&pool).await?;
    let task = TaskRepository::find(&mut tx, task_id.into_inner(), user.id)
        .await?
        .ok_or(AppError::TaskNotFound)?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Updates a task's title and/or completion state.
///
/// ## Request Body:
/// - `title` (optional): same rules as on create.
/// - `completed` (optional).
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `404 Not Found`: no such task for this user.
/// - `422 Unprocessable Entity`: invalid title.
#[utoipa::path(
    put,
    path = "/api/todos/{id}",
    tag = "todos",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = TaskUpdate,
    responses(
        (status = 200, description = "The updated task", body = Task),
        (status = 404, description = "No such task for this user", body = ErrorResponse),
        (status = 422, description = "Invalid title", body = ErrorResponse)
    )
)]
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let mut tx = db::begin(&pool).await?;
    let task = TaskRepository::update(
        &mut tx,
        task_id.into_inner(),
        user.id,
        task_data.normalized_title(),
        task_data.completed,
    )
    .await?
    .ok_or(AppError::TaskNotFound)?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Permanently deletes a task.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such task for this user.
#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    tag = "todos",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "No such task for this user", body = ErrorResponse)
    )
)]
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();

    let mut tx = db::begin(&pool).await?;
    if !TaskRepository::delete(&mut tx, task_id, user.id).await? {
        return Err(AppError::TaskNotFound);
    }
    tx.commit().await?;

    log::info!("User {} deleted task {}", user.id, task_id);
    Ok(HttpResponse::NoContent().finish())
}

/// Flips `completed`. Calling it twice restores the original state.
#[utoipa::path(
    patch,
    path = "/api/todos/{id}/complete",
    tag = "todos",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task with `completed` flipped", body = Task),
        (status = 404, description = "No such task for this user", body = ErrorResponse)
    )
)]
#[patch("/{id}/complete")]
pub async fn toggle_task_complete(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let mut tx = db::begin(&pool).await?;
    let task = TaskRepository::toggle_complete(&mut tx, task_id.into_inner(), user.id)
        .await?
        .ok_or(AppError::TaskNotFound)?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(task))
}
