/// Subtask model
///
/// Subtasks belong to exactly one task and carry a completion flag. The
/// `task_id` reference is unconstrained: deleting the parent task leaves its
/// subtasks behind. Single-entity updates and deletes do not re-verify that
/// the parent task still exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Subtask row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subtask {
    /// Unique subtask ID
    pub id: Uuid,

    /// Task this subtask belongs to (may dangle after a task deletion)
    pub task_id: Uuid,

    /// Subtask title
    pub title: String,

    /// Completion flag
    pub is_completed: bool,

    /// User who created the subtask
    pub created_by: Option<Uuid>,

    /// When the subtask was created
    pub created_at: DateTime<Utc>,

    /// When the subtask was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a subtask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubtask {
    /// Parent task ID
    pub task_id: Uuid,

    /// Subtask title
    pub title: String,

    /// Initial completion flag
    pub is_completed: bool,

    /// Creating user
    pub created_by: Option<Uuid>,
}

/// Input for a partial subtask update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSubtask {
    /// New title
    pub title: Option<String>,

    /// New completion flag
    pub is_completed: Option<bool>,
}

const SUBTASK_COLUMNS: &str = "id, task_id, title, is_completed, created_by, created_at, updated_at";

impl Subtask {
    /// Creates a new subtask
    pub async fn create(pool: &PgPool, data: CreateSubtask) -> Result<Self, sqlx::Error> {
        let subtask = sqlx::query_as::<_, Subtask>(&format!(
            r#"
            INSERT INTO subtasks (task_id, title, is_completed, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {SUBTASK_COLUMNS}
            "#,
        ))
        .bind(data.task_id)
        .bind(data.title)
        .bind(data.is_completed)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(subtask)
    }

    /// Finds a subtask by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let subtask = sqlx::query_as::<_, Subtask>(&format!(
            "SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(subtask)
    }

    /// Applies a partial patch to a subtask
    ///
    /// # Returns
    ///
    /// The post-update subtask, or None if no subtask with that id exists.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateSubtask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let subtask = sqlx::query_as::<_, Subtask>(&format!(
            r#"
            UPDATE subtasks
            SET title = COALESCE($2, title),
                is_completed = COALESCE($3, is_completed),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SUBTASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.is_completed)
        .fetch_optional(pool)
        .await?;

        Ok(subtask)
    }

    /// Deletes a subtask by ID
    ///
    /// # Returns
    ///
    /// The deleted subtask, or None if no subtask with that id exists.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let subtask = sqlx::query_as::<_, Subtask>(&format!(
            "DELETE FROM subtasks WHERE id = $1 RETURNING {SUBTASK_COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(subtask)
    }
}
