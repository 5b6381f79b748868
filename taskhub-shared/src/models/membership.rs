/// Membership model: the source of truth for project authorization
///
/// A membership grants one user one role within one project. The table is
/// keyed on `(project_id, user_id)`, so the lookup used by the permission
/// gate can assume at most one row per pair. Memberships are created and
/// removed by the external project-management flow; every gated request
/// re-reads them, there is no cache.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('admin', 'project_admin', 'member');
///
/// CREATE TABLE memberships (
///     project_id UUID NOT NULL,
///     user_id UUID NOT NULL,
///     role project_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role of a user within a project
///
/// A closed set: invalid roles are unrepresentable, both in Rust and in the
/// Postgres enum backing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    /// Full control over the project and its members
    Admin,

    /// Can manage tasks and subtasks within the project
    ProjectAdmin,

    /// Regular member: can view, and update subtasks
    Member,
}

impl ProjectRole {
    /// Role label as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Admin => "admin",
            ProjectRole::ProjectAdmin => "project_admin",
            ProjectRole::Member => "member",
        }
    }
}

/// Membership row linking a user to a project with a role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a membership (external flow and fixtures)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: ProjectRole,
}

fn default_role() -> ProjectRole {
    ProjectRole::Member
}

impl Membership {
    /// Creates a new membership (adds a user to a project)
    ///
    /// # Errors
    ///
    /// Returns an error if the (project, user) pair already has a membership
    /// or the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING project_id, user_id, role, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Finds the membership of a user in a project
    ///
    /// Exact-equality lookup on both identifiers; a pure read. Identifier
    /// syntax is validated by the caller before this is reached, so the
    /// lookup itself only ever sees well-formed UUIDs.
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT project_id, user_id, role, created_at
            FROM memberships
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Removes a user from a project
    ///
    /// Returns true if a membership was deleted.
    pub async fn delete(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM memberships WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels() {
        assert_eq!(ProjectRole::Admin.as_str(), "admin");
        assert_eq!(ProjectRole::ProjectAdmin.as_str(), "project_admin");
        assert_eq!(ProjectRole::Member.as_str(), "member");
    }

    #[test]
    fn test_role_serde_labels() {
        let json = serde_json::to_string(&ProjectRole::ProjectAdmin).unwrap();
        assert_eq!(json, "\"project_admin\"");

        let parsed: ProjectRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, ProjectRole::Admin);
    }

    #[test]
    fn test_invalid_role_is_rejected() {
        let parsed: Result<ProjectRole, _> = serde_json::from_str("\"superuser\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_create_membership_default_role() {
        assert_eq!(default_role(), ProjectRole::Member);
    }
}
