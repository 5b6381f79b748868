/// Project model
///
/// Projects are created and deleted by an external project-management flow;
/// this system only references them. Orchestrators call [`Project::exists`]
/// before creating child entities, and that check is a separate statement
/// from the insert that follows it: a concurrent project deletion can land
/// between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Project row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// User who created the project
    pub created_by: Option<Uuid>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project (external flow and fixtures)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Creating user
    pub created_by: Option<Uuid>,
}

impl Project {
    /// Creates a new project row
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_by, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Checks whether a project exists
    ///
    /// The existence check used by orchestrators before creating tasks and
    /// notes under a project.
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }
}
