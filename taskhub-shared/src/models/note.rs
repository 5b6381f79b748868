/// Project note model
///
/// Notes are free-text content scoped to a project. Listings and single
/// fetches annotate each note with the creator's public projection the same
/// way the task views do: a deleted creator degrades to an absent field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserPublic;

/// Note row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    /// Unique note ID
    pub id: Uuid,

    /// Project this note belongs to
    pub project_id: Uuid,

    /// Free-text content
    pub content: String,

    /// User who created the note
    pub created_by: Option<Uuid>,

    /// When the note was created
    pub created_at: DateTime<Utc>,

    /// When the note was last updated
    pub updated_at: DateTime<Utc>,
}

/// Note annotated with its creator's public projection
///
/// Same shape as [`Note`], except `created_by` carries the creator's
/// projection instead of the raw id.
#[derive(Debug, Clone, Serialize)]
pub struct NoteWithCreator {
    /// Unique note ID
    pub id: Uuid,

    /// Project this note belongs to
    pub project_id: Uuid,

    /// Free-text content
    pub content: String,

    /// Creator projection, absent when the user was deleted
    pub created_by: Option<UserPublic>,

    /// When the note was created
    pub created_at: DateTime<Utc>,

    /// When the note was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNote {
    /// Project ID
    pub project_id: Uuid,

    /// Free-text content
    pub content: String,

    /// Creating user
    pub created_by: Option<Uuid>,
}

/// Flat join row: note columns plus the creator's public columns
#[derive(Debug, sqlx::FromRow)]
struct NoteCreatorRow {
    id: Uuid,
    project_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_id: Option<Uuid>,
    creator_username: Option<String>,
    creator_full_name: Option<String>,
    creator_avatar_url: Option<String>,
}

impl NoteCreatorRow {
    fn into_note_with_creator(self) -> NoteWithCreator {
        let created_by = self.creator_id.map(|id| UserPublic {
            id,
            username: self.creator_username.clone().unwrap_or_default(),
            full_name: self.creator_full_name.clone(),
            avatar_url: self.creator_avatar_url.clone(),
        });

        NoteWithCreator {
            id: self.id,
            project_id: self.project_id,
            content: self.content,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const NOTE_COLUMNS: &str = "id, project_id, content, created_by, created_at, updated_at";

const NOTE_JOIN_COLUMNS: &str = "n.id, n.project_id, n.content, \
                                 n.created_at, n.updated_at, \
                                 u.id AS creator_id, u.username AS creator_username, \
                                 u.full_name AS creator_full_name, u.avatar_url AS creator_avatar_url";

impl Note {
    /// Creates a new note
    pub async fn create(pool: &PgPool, data: CreateNote) -> Result<Self, sqlx::Error> {
        let note = sqlx::query_as::<_, Note>(&format!(
            r#"
            INSERT INTO notes (project_id, content, created_by)
            VALUES ($1, $2, $3)
            RETURNING {NOTE_COLUMNS}
            "#,
        ))
        .bind(data.project_id)
        .bind(data.content)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(note)
    }

    /// Lists all notes of a project with creator projections
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<NoteWithCreator>, sqlx::Error> {
        let rows = sqlx::query_as::<_, NoteCreatorRow>(&format!(
            r#"
            SELECT {NOTE_JOIN_COLUMNS}
            FROM notes n
            LEFT JOIN users u ON u.id = n.created_by
            WHERE n.project_id = $1
            ORDER BY n.created_at ASC, n.id ASC
            "#,
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(NoteCreatorRow::into_note_with_creator)
            .collect())
    }

    /// Finds a note by ID with its creator projection
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<NoteWithCreator>, sqlx::Error> {
        let row = sqlx::query_as::<_, NoteCreatorRow>(&format!(
            r#"
            SELECT {NOTE_JOIN_COLUMNS}
            FROM notes n
            LEFT JOIN users u ON u.id = n.created_by
            WHERE n.id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(NoteCreatorRow::into_note_with_creator))
    }

    /// Replaces a note's content
    ///
    /// # Returns
    ///
    /// The post-update note, or None if no note with that id exists.
    pub async fn update_content(
        pool: &PgPool,
        id: Uuid,
        content: String,
    ) -> Result<Option<Self>, sqlx::Error> {
        let note = sqlx::query_as::<_, Note>(&format!(
            r#"
            UPDATE notes
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {NOTE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(content)
        .fetch_optional(pool)
        .await?;

        Ok(note)
    }

    /// Deletes a note by ID
    ///
    /// # Returns
    ///
    /// The deleted note, or None if no note with that id exists.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let note = sqlx::query_as::<_, Note>(&format!(
            "DELETE FROM notes WHERE id = $1 RETURNING {NOTE_COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(note)
    }
}
