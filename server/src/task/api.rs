use crate::task::Task;
use crate::web::AppState;
use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const TITLE_LIMIT: usize = 100;
const DESCRIPTION_LIMIT: usize = 500;

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// Unique identifier for the task
    task_id: String,
    /// Creation time in milliseconds since the epoch
    created_at: i64,
    /// Title of the task
    title: String,
    /// Description of the task, possibly empty
    description: String,
    /// Lifecycle state, always `pending`
    status: String,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.task_id().to_string(),
            created_at: task.created_at(),
            title: task.title().to_string(),
            description: task.description().to_string(),
            status: task.status().as_str().to_string(),
        }
    }
}

/// API response for listing all tasks.
#[derive(Debug, Serialize, ToSchema)]
pub struct TasksResponse {
    /// Stored tasks, newest first
    tasks: Vec<TaskJson>,
}

/// API response for a successfully created task.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateTaskResponse {
    /// The created task as persisted
    task: TaskJson,
}

/// Request body for creating a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Task title, 1-100 characters after trimming
    pub title: String,
    /// Optional task description, up to 500 characters after trimming
    pub description: Option<String>,
}

/// Error body returned by task endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Short description of the failure
    error: String,
    /// Underlying diagnostic message, present on server-side failures
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

/// Client-caused request rejection. Maps to a 400 response naming the
/// violated rule.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(String);

/// Checks a create-task request body, rule by rule, short-circuiting on the
/// first violation. Returns the trimmed `(title, description)` pair; an
/// absent description becomes an empty string.
///
/// The body is inspected as raw JSON rather than deserialized into
/// [`CreateTaskRequest`] so that a wrongly-typed field yields the exact
/// rejection message instead of a generic deserialization error.
fn validate_create_request(body: &serde_json::Value) -> Result<(String, String), ValidationError> {
    let title = match body.get("title") {
        Some(serde_json::Value::String(title)) => title.trim(),
        _ => {
            return Err(ValidationError(
                "Title is required and must be a string".to_string(),
            ));
        }
    };
    if title.is_empty() {
        return Err(ValidationError(
            "Title is required and must be a string".to_string(),
        ));
    }
    if title.chars().count() > TITLE_LIMIT {
        return Err(ValidationError(
            "Title must be 100 characters or less".to_string(),
        ));
    }

    let description = match body.get("description") {
        None | Some(serde_json::Value::Null) => "",
        Some(serde_json::Value::String(description)) => description.trim(),
        Some(_) => {
            return Err(ValidationError("Description must be a string".to_string()));
        }
    };
    if description.chars().count() > DESCRIPTION_LIMIT {
        return Err(ValidationError(
            "Description must be 500 characters or less".to_string(),
        ));
    }

    Ok((title.to_string(), description.to_string()))
}

/// Handler for GET /api/tasks - returns every stored task, newest first.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/tasks",
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = TasksResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_tasks_handler(
    State(state): State<AppState>,
) -> Result<Json<TasksResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.list_tasks().await {
        Ok(tasks) => {
            tracing::info!(count = tasks.len(), "tasks retrieved");
            let tasks = tasks.into_iter().map(TaskJson::from).collect();
            Ok(Json(TasksResponse { tasks }))
        }
        Err(err) => {
            tracing::error!("failed to retrieve tasks: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_message(
                    "Failed to retrieve tasks",
                    err.to_string(),
                )),
            ))
        }
    }
}

/// Handler for POST /api/tasks - validates the request and stores a new task.
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = CreateTaskResponse),
        (status = 400, description = "Validation failure", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), (StatusCode, Json<ErrorResponse>)> {
    let (title, description) = validate_create_request(&body).map_err(|err| {
        tracing::info!("task creation rejected: {}", err);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(err.to_string())),
        )
    })?;

    match state.store.insert_task(title, description).await {
        Ok(task) => {
            tracing::info!(task_id = task.task_id(), title = task.title(), "task created");
            Ok((
                StatusCode::CREATED,
                Json(CreateTaskResponse { task: task.into() }),
            ))
        }
        Err(err) => {
            tracing::error!("failed to create task: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_message(
                    "Failed to create task",
                    err.to_string(),
                )),
            ))
        }
    }
}

/// Creates and returns the tasks API router.
pub fn create_task_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/tasks",
            get(get_tasks_handler).post(create_task_handler),
        )
        .with_state(state)
}
