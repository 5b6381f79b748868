/// Task model, attachments, and the denormalized detail view
///
/// Tasks belong to exactly one project and may be assigned to one user.
/// [`Task::fetch_detail`] is the one genuinely composite read in the system:
/// it joins the assignee and every subtask with its creator into a single
/// [`TaskDetail`]. Join targets are deliberately unconstrained in the schema,
/// so a deleted user leaves a dangling reference behind; the detail view
/// degrades that to an absent projection instead of failing the read.
///
/// Deleting a task does NOT delete its subtasks. They stay behind with a
/// dangling `task_id`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     assigned_to UUID,
///     assigned_by UUID,
///     status task_status NOT NULL DEFAULT 'todo',
///     attachments JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserPublic;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Status label as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

/// File attachment metadata stored on a task
///
/// Produced by the upload layer (url derived from the configured base URL
/// plus the storage-assigned filename) and stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Public URL of the stored file
    pub url: String,

    /// Media type as reported by the upload layer
    pub mimetype: String,

    /// Size in bytes
    pub size: i64,
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Project this task belongs to
    pub project_id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Assigned user (None if unassigned; may dangle if the user was deleted)
    pub assigned_to: Option<Uuid>,

    /// User who created/assigned the task
    pub assigned_by: Option<Uuid>,

    /// Workflow status
    pub status: TaskStatus,

    /// File attachments (JSONB array)
    pub attachments: Json<Vec<Attachment>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Task with its assignee's public projection, as returned by project
/// listings and the detail view
///
/// Same shape as [`Task`], except `assigned_to` carries the assignee's
/// projection instead of the raw id. Unassigned tasks and dangling
/// references both surface as an absent field.
#[derive(Debug, Clone, Serialize)]
pub struct TaskWithAssignee {
    /// Unique task ID
    pub id: Uuid,

    /// Project this task belongs to
    pub project_id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Assignee projection, absent when unassigned or the user was deleted
    pub assigned_to: Option<UserPublic>,

    /// User who created/assigned the task
    pub assigned_by: Option<Uuid>,

    /// Workflow status
    pub status: TaskStatus,

    /// File attachments
    pub attachments: Json<Vec<Attachment>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// The denormalized task detail view
///
/// One task, its assignee projection, and its subtasks in insertion order,
/// each annotated with the creator's projection.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    /// The task with its assignee projection
    #[serde(flatten)]
    pub task: TaskWithAssignee,

    /// Subtasks in creation order
    pub subtasks: Vec<SubtaskDetail>,
}

/// A subtask annotated with its creator's public projection
///
/// Same shape as the subtask row, except `created_by` carries the creator's
/// projection instead of the raw id.
#[derive(Debug, Clone, Serialize)]
pub struct SubtaskDetail {
    /// Unique subtask ID
    pub id: Uuid,

    /// Task this subtask belongs to
    pub task_id: Uuid,

    /// Subtask title
    pub title: String,

    /// Completion flag
    pub is_completed: bool,

    /// Creator projection, absent when the user was deleted
    pub created_by: Option<UserPublic>,

    /// When the subtask was created
    pub created_at: DateTime<Utc>,

    /// When the subtask was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Project ID
    pub project_id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Optional assignee
    pub assigned_to: Option<Uuid>,

    /// Creating user
    pub assigned_by: Option<Uuid>,

    /// Initial status
    pub status: TaskStatus,

    /// Attachments recorded at creation
    pub attachments: Vec<Attachment>,
}

/// Input for a partial task update
///
/// Only fields that are `Some` are written. `attachments` APPEND to the
/// stored array; the existing entries are never replaced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New assignee
    pub assigned_to: Option<Uuid>,

    /// New status
    pub status: Option<TaskStatus>,

    /// Attachments to append
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Flat join row: task columns plus the assignee's public columns
#[derive(Debug, sqlx::FromRow)]
struct TaskAssigneeRow {
    id: Uuid,
    project_id: Uuid,
    title: String,
    description: Option<String>,
    assigned_by: Option<Uuid>,
    status: TaskStatus,
    attachments: Json<Vec<Attachment>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assignee_id: Option<Uuid>,
    assignee_username: Option<String>,
    assignee_full_name: Option<String>,
    assignee_avatar_url: Option<String>,
}

impl TaskAssigneeRow {
    /// Collapses the zero-or-one-row join result into a singular optional
    /// projection. A dangling `assigned_to` produces None here, not an error.
    fn into_task_with_assignee(self) -> TaskWithAssignee {
        let assigned_to = self.assignee_id.map(|id| UserPublic {
            id,
            username: self.assignee_username.clone().unwrap_or_default(),
            full_name: self.assignee_full_name.clone(),
            avatar_url: self.assignee_avatar_url.clone(),
        });

        TaskWithAssignee {
            id: self.id,
            project_id: self.project_id,
            title: self.title,
            description: self.description,
            assigned_to,
            assigned_by: self.assigned_by,
            status: self.status,
            attachments: self.attachments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Flat join row: subtask columns plus the creator's public columns
#[derive(Debug, sqlx::FromRow)]
struct SubtaskCreatorRow {
    id: Uuid,
    task_id: Uuid,
    title: String,
    is_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_id: Option<Uuid>,
    creator_username: Option<String>,
    creator_full_name: Option<String>,
    creator_avatar_url: Option<String>,
}

impl SubtaskCreatorRow {
    fn into_subtask_detail(self) -> SubtaskDetail {
        let created_by = self.creator_id.map(|id| UserPublic {
            id,
            username: self.creator_username.clone().unwrap_or_default(),
            full_name: self.creator_full_name.clone(),
            avatar_url: self.creator_avatar_url.clone(),
        });

        SubtaskDetail {
            id: self.id,
            task_id: self.task_id,
            title: self.title,
            is_completed: self.is_completed,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const TASK_COLUMNS: &str = "id, project_id, title, description, assigned_to, assigned_by, \
                            status, attachments, created_at, updated_at";

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (project_id, title, description, assigned_to, assigned_by, status, attachments)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.assigned_to)
        .bind(data.assigned_by)
        .bind(data.status)
        .bind(Json(data.attachments))
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Checks whether a task exists
    ///
    /// Used by the subtask orchestrator before creating a child. The check
    /// and the insert that follows are separate statements; a concurrent
    /// task deletion can land between them.
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(exists)
    }

    /// Lists all tasks of a project with their assignee projections
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<TaskWithAssignee>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskAssigneeRow>(
            r#"
            SELECT t.id, t.project_id, t.title, t.description, t.assigned_by,
                   t.status, t.attachments, t.created_at, t.updated_at,
                   u.id AS assignee_id, u.username AS assignee_username,
                   u.full_name AS assignee_full_name, u.avatar_url AS assignee_avatar_url
            FROM tasks t
            LEFT JOIN users u ON u.id = t.assigned_to
            WHERE t.project_id = $1
            ORDER BY t.created_at ASC, t.id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(TaskAssigneeRow::into_task_with_assignee)
            .collect())
    }

    /// Assembles the denormalized detail view for a task
    ///
    /// Two sequential reads: the task joined to its assignee, then the
    /// subtasks joined to their creators in insertion order. Missing join
    /// targets degrade to absent projections.
    ///
    /// # Returns
    ///
    /// None if no task with that id exists.
    pub async fn fetch_detail(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskDetail>, sqlx::Error> {
        let row = sqlx::query_as::<_, TaskAssigneeRow>(
            r#"
            SELECT t.id, t.project_id, t.title, t.description, t.assigned_by,
                   t.status, t.attachments, t.created_at, t.updated_at,
                   u.id AS assignee_id, u.username AS assignee_username,
                   u.full_name AS assignee_full_name, u.avatar_url AS assignee_avatar_url
            FROM tasks t
            LEFT JOIN users u ON u.id = t.assigned_to
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let with_assignee = row.into_task_with_assignee();

        let subtask_rows = sqlx::query_as::<_, SubtaskCreatorRow>(
            r#"
            SELECT s.id, s.task_id, s.title, s.is_completed,
                   s.created_at, s.updated_at,
                   u.id AS creator_id, u.username AS creator_username,
                   u.full_name AS creator_full_name, u.avatar_url AS creator_avatar_url
            FROM subtasks s
            LEFT JOIN users u ON u.id = s.created_by
            WHERE s.task_id = $1
            ORDER BY s.created_at ASC, s.id ASC
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(Some(TaskDetail {
            task: with_assignee,
            subtasks: subtask_rows
                .into_iter()
                .map(SubtaskCreatorRow::into_subtask_detail)
                .collect(),
        }))
    }

    /// Applies a partial patch to a task
    ///
    /// Fields left as None keep their stored value; attachments append.
    ///
    /// # Returns
    ///
    /// The post-update task, or None if no task with that id exists.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                assigned_to = COALESCE($4, assigned_to),
                status = COALESCE($5, status),
                attachments = attachments || $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.assigned_to)
        .bind(data.status)
        .bind(Json(data.attachments))
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task by ID
    ///
    /// Subtasks of the task are left in place with a dangling `task_id`.
    ///
    /// # Returns
    ///
    /// The deleted task, or None if no task with that id exists.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 RETURNING {TASK_COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_status_serde_roundtrip() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let parsed: TaskStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(parsed, TaskStatus::Done);
    }

    fn join_row(assignee: Option<(Uuid, &str)>) -> TaskAssigneeRow {
        TaskAssigneeRow {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Ship the release".to_string(),
            description: None,
            assigned_by: None,
            status: TaskStatus::Todo,
            attachments: Json(Vec::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            assignee_id: assignee.map(|(id, _)| id),
            assignee_username: assignee.map(|(_, name)| name.to_string()),
            assignee_full_name: None,
            assignee_avatar_url: None,
        }
    }

    #[test]
    fn test_assignee_collapse_absent_on_dangling_reference() {
        // A dangling assigned_to joins to zero user rows; the projection
        // must come back absent rather than failing the assembly.
        let view = join_row(None).into_task_with_assignee();
        assert!(view.assigned_to.is_none());
    }

    #[test]
    fn test_assignee_collapse_present() {
        let assignee = Uuid::new_v4();
        let view = join_row(Some((assignee, "mira"))).into_task_with_assignee();

        let projection = view.assigned_to.expect("assignee projection");
        assert_eq!(projection.id, assignee);
        assert_eq!(projection.username, "mira");
    }

    #[test]
    fn test_detail_serializes_projection_under_assigned_to() {
        let assignee = Uuid::new_v4();
        let detail = TaskDetail {
            task: join_row(Some((assignee, "mira"))).into_task_with_assignee(),
            subtasks: Vec::new(),
        };

        let json = serde_json::to_value(&detail).unwrap();
        // Flattened view: one assigned_to key, carrying the projection.
        assert_eq!(json["assigned_to"]["username"], "mira");
        assert_eq!(json["subtasks"], serde_json::json!([]));
    }

    #[test]
    fn test_attachment_serde() {
        let attachment = Attachment {
            url: "http://localhost:8080/images/report.pdf".to_string(),
            mimetype: "application/pdf".to_string(),
            size: 4096,
        };

        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["url"], "http://localhost:8080/images/report.pdf");
        assert_eq!(json["mimetype"], "application/pdf");
        assert_eq!(json["size"], 4096);
    }
}
