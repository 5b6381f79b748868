/// Task and subtask endpoints
///
/// Every handler is scoped by a project and runs the permission gate first
/// with its own allowed-role set; reads admit any member, mutations are
/// restricted to admins and project admins (except subtask updates, which
/// any member may perform). Attachments arrive as already-buffered upload
/// descriptors; the handler derives the public URL from the configured base
/// URL and stores the result verbatim.
///
/// # Endpoints
///
/// - `GET    /api/v1/tasks/:project_id` — list tasks with assignee projections
/// - `POST   /api/v1/tasks/:project_id` — create task
/// - `GET    /api/v1/tasks/:project_id/t/:task_id` — denormalized detail view
/// - `PUT    /api/v1/tasks/:project_id/t/:task_id` — partial patch, attachments append
/// - `DELETE /api/v1/tasks/:project_id/t/:task_id` — delete (subtasks survive)
/// - `POST   /api/v1/tasks/:project_id/t/:task_id/subtasks` — create subtask
/// - `PUT    /api/v1/tasks/:project_id/st/:subtask_id` — update subtask
/// - `DELETE /api/v1/tasks/:project_id/st/:subtask_id` — delete subtask

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::parse_id,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::{
    auth::authorization::authorize,
    models::{
        membership::ProjectRole,
        project::Project,
        subtask::{CreateSubtask, Subtask, UpdateSubtask},
        task::{Attachment, CreateTask, Task, TaskDetail, TaskStatus, TaskWithAssignee, UpdateTask},
        user::CurrentUser,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Roles allowed to mutate tasks and subtasks
const TASK_MUTATORS: &[ProjectRole] = &[ProjectRole::Admin, ProjectRole::ProjectAdmin];

/// Empty set: any member of the project
const ANY_MEMBER: &[ProjectRole] = &[];

/// An already-buffered upload, as handed over by the upload layer
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AttachmentUpload {
    /// Storage-assigned filename
    #[validate(length(min = 1, max = 255, message = "Filename is required"))]
    pub filename: String,

    /// Media type reported by the upload layer
    #[validate(length(min = 1, max = 255, message = "Mimetype is required"))]
    pub mimetype: String,

    /// Size in bytes
    pub size: i64,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Optional assignee
    pub assigned_to: Option<Uuid>,

    /// Initial status (defaults to todo)
    pub status: Option<TaskStatus>,

    /// Buffered uploads to attach
    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<AttachmentUpload>,
}

/// Update task request (partial patch; attachments append)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New assignee
    pub assigned_to: Option<Uuid>,

    /// New status
    pub status: Option<TaskStatus>,

    /// Buffered uploads to append
    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<AttachmentUpload>,
}

/// Create subtask request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubtaskRequest {
    /// Subtask title
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    /// Initial completion flag
    #[serde(default)]
    pub is_completed: bool,
}

/// Update subtask request (partial patch)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSubtaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: Option<String>,

    /// New completion flag
    pub is_completed: Option<bool>,
}

/// Maps buffered uploads to stored attachment metadata
fn build_attachments(state: &AppState, uploads: Vec<AttachmentUpload>) -> Vec<Attachment> {
    uploads
        .into_iter()
        .map(|file| Attachment {
            url: state.config.uploads.attachment_url(&file.filename),
            mimetype: file.mimetype,
            size: file.size,
        })
        .collect()
}

/// Lists all tasks of a project
///
/// Any member may read. 404 when the project does not exist.
pub async fn get_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<TaskWithAssignee>>> {
    let ctx = authorize(&state.db, user.id, Some(&project_id), ANY_MEMBER).await?;

    if !Project::exists(&state.db, ctx.project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    let tasks = Task::list_by_project(&state.db, ctx.project_id).await?;

    Ok(Json(tasks))
}

/// Creates a task in a project
///
/// Admin or project-admin only. The project-existence check and the insert
/// are separate statements; a concurrent project deletion can land between
/// them.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<String>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let ctx = authorize(&state.db, user.id, Some(&project_id), TASK_MUTATORS).await?;

    request.validate()?;

    if !Project::exists(&state.db, ctx.project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    let attachments = build_attachments(&state, request.attachments);

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id: ctx.project_id,
            title: request.title,
            description: request.description,
            assigned_to: request.assigned_to,
            assigned_by: Some(user.id),
            status: request.status.unwrap_or(TaskStatus::Todo),
            attachments,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, project_id = %ctx.project_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Fetches the denormalized detail view of a task
///
/// Any member may read. The view joins the assignee and every subtask with
/// its creator; dangling references degrade to absent projections.
pub async fn get_task_by_id(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, task_id)): Path<(String, String)>,
) -> ApiResult<Json<TaskDetail>> {
    authorize(&state.db, user.id, Some(&project_id), ANY_MEMBER).await?;
    let task_id = parse_id(&task_id, "task")?;

    let detail = Task::fetch_detail(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(detail))
}

/// Applies a partial patch to a task
///
/// Admin or project-admin only. New attachments are appended to the stored
/// array, never replacing it. The parent project is not re-verified.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, task_id)): Path<(String, String)>,
    Json(request): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    authorize(&state.db, user.id, Some(&project_id), TASK_MUTATORS).await?;
    let task_id = parse_id(&task_id, "task")?;

    request.validate()?;

    let attachments = build_attachments(&state, request.attachments);

    let task = Task::update(
        &state.db,
        task_id,
        UpdateTask {
            title: request.title,
            description: request.description,
            assigned_to: request.assigned_to,
            status: request.status,
            attachments,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %task.id, "Task updated");

    Ok(Json(task))
}

/// Deletes a task
///
/// Admin or project-admin only. Subtasks of the task are left in place.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, task_id)): Path<(String, String)>,
) -> ApiResult<Json<Task>> {
    authorize(&state.db, user.id, Some(&project_id), TASK_MUTATORS).await?;
    let task_id = parse_id(&task_id, "task")?;

    let task = Task::delete(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %task.id, "Task deleted");

    Ok(Json(task))
}

/// Creates a subtask under a task
///
/// Admin or project-admin only. Verifies the parent task exists first; the
/// check and the insert are separate statements.
pub async fn create_subtask(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, task_id)): Path<(String, String)>,
    Json(request): Json<CreateSubtaskRequest>,
) -> ApiResult<(StatusCode, Json<Subtask>)> {
    authorize(&state.db, user.id, Some(&project_id), TASK_MUTATORS).await?;
    let task_id = parse_id(&task_id, "task")?;

    request.validate()?;

    if !Task::exists(&state.db, task_id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    let subtask = Subtask::create(
        &state.db,
        CreateSubtask {
            task_id,
            title: request.title,
            is_completed: request.is_completed,
            created_by: Some(user.id),
        },
    )
    .await?;

    tracing::info!(subtask_id = %subtask.id, task_id = %task_id, "Subtask created");

    Ok((StatusCode::CREATED, Json(subtask)))
}

/// Applies a partial patch to a subtask
///
/// Any member may update a subtask. The parent task is not re-verified.
pub async fn update_subtask(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, subtask_id)): Path<(String, String)>,
    Json(request): Json<UpdateSubtaskRequest>,
) -> ApiResult<Json<Subtask>> {
    authorize(&state.db, user.id, Some(&project_id), ANY_MEMBER).await?;
    let subtask_id = parse_id(&subtask_id, "subtask")?;

    request.validate()?;

    let subtask = Subtask::update(
        &state.db,
        subtask_id,
        UpdateSubtask {
            title: request.title,
            is_completed: request.is_completed,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Subtask not found".to_string()))?;

    tracing::info!(subtask_id = %subtask.id, "Subtask updated");

    Ok(Json(subtask))
}

/// Deletes a subtask
///
/// Admin or project-admin only.
pub async fn delete_subtask(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, subtask_id)): Path<(String, String)>,
) -> ApiResult<Json<Subtask>> {
    authorize(&state.db, user.id, Some(&project_id), TASK_MUTATORS).await?;
    let subtask_id = parse_id(&subtask_id, "subtask")?;

    let subtask = Subtask::delete(&state.db, subtask_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subtask not found".to_string()))?;

    tracing::info!(subtask_id = %subtask.id, "Subtask deleted");

    Ok(Json(subtask))
}
