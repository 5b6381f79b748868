/// User model and database operations
///
/// Users are created by an external registration flow; TaskHub only reads
/// them. The full row carries credential columns (`password_hash`,
/// `refresh_token`) that must never cross the API boundary: request handling
/// works with [`CurrentUser`], and cross-entity projections use
/// [`UserPublic`], neither of which selects the sensitive columns.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(100) NOT NULL UNIQUE,
///     full_name VARCHAR(255),
///     avatar_url VARCHAR(512),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     password_hash VARCHAR(255) NOT NULL,
///     refresh_token VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Full user row, including credential columns
///
/// Only used by the external registration/login flows and by test fixtures.
/// Request handling never touches this shape.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Unique handle used in mentions and projections
    pub username: String,

    /// Optional display name
    pub full_name: Option<String>,

    /// Optional avatar URL
    pub avatar_url: Option<String>,

    /// Email address
    pub email: String,

    /// Whether the email address has been verified
    pub email_verified: bool,

    /// Credential hash; never exposed downstream
    pub password_hash: String,

    /// Long-lived refresh token; never exposed downstream
    pub refresh_token: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Public identity projection
///
/// The only user shape embedded in tasks, subtasks, and notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserPublic {
    /// User ID
    pub id: Uuid,

    /// Unique handle
    pub username: String,

    /// Optional display name
    pub full_name: Option<String>,

    /// Optional avatar URL
    pub avatar_url: Option<String>,
}

/// The authenticated caller, as seen by request handlers
///
/// Loaded by the session resolver after token validation. Carries every
/// non-sensitive column of the user row; the credential columns are not even
/// selected by [`CurrentUser::load`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CurrentUser {
    /// User ID
    pub id: Uuid,

    /// Unique handle
    pub username: String,

    /// Optional display name
    pub full_name: Option<String>,

    /// Optional avatar URL
    pub avatar_url: Option<String>,

    /// Email address
    pub email: String,

    /// Whether the email address has been verified
    pub email_verified: bool,
}

/// Input for creating a new user (external registration flow and fixtures)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Unique handle
    pub username: String,

    /// Optional display name
    pub full_name: Option<String>,

    /// Optional avatar URL
    pub avatar_url: Option<String>,

    /// Email address
    pub email: String,

    /// Credential hash (NOT a plaintext password)
    pub password_hash: String,
}

impl User {
    /// Creates a new user row
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email already exists, or the
    /// database operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, full_name, avatar_url, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, full_name, avatar_url, email, email_verified,
                      password_hash, refresh_token, created_at, updated_at
            "#,
        )
        .bind(data.username)
        .bind(data.full_name)
        .bind(data.avatar_url)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user by ID
    ///
    /// Returns true if a row was deleted. Tasks and subtasks referencing the
    /// user keep their dangling ids; reads degrade them to absent projections.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl CurrentUser {
    /// Loads the non-sensitive columns of a user by ID
    ///
    /// # Returns
    ///
    /// The caller's identity if the user still exists, None otherwise.
    pub async fn load(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, CurrentUser>(
            r#"
            SELECT id, username, full_name, avatar_url, email, email_verified
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// The public projection of the caller
    pub fn public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_user_public_projection() {
        let current = CurrentUser {
            id: Uuid::new_v4(),
            username: "mira".to_string(),
            full_name: Some("Mira Holt".to_string()),
            avatar_url: None,
            email: "mira@example.com".to_string(),
            email_verified: true,
        };

        let public = current.public();
        assert_eq!(public.id, current.id);
        assert_eq!(public.username, "mira");
        assert_eq!(public.full_name.as_deref(), Some("Mira Holt"));
        assert!(public.avatar_url.is_none());
    }

    #[test]
    fn test_public_projection_has_no_sensitive_fields() {
        let public = UserPublic {
            id: Uuid::new_v4(),
            username: "mira".to_string(),
            full_name: None,
            avatar_url: None,
        };

        let json = serde_json::to_value(&public).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("password_hash"));
        assert!(!object.contains_key("refresh_token"));
        assert!(!object.contains_key("email"));
    }
}
