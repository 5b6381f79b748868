/// Project note endpoints
///
/// Reads admit any member of the project; all note mutations are restricted
/// to admins. Listings and single fetches carry the creator's public
/// projection.
///
/// # Endpoints
///
/// - `GET    /api/v1/notes/:project_id` — list notes with creator projections
/// - `POST   /api/v1/notes/:project_id` — create note
/// - `GET    /api/v1/notes/:project_id/n/:note_id` — fetch note
/// - `PUT    /api/v1/notes/:project_id/n/:note_id` — replace content
/// - `DELETE /api/v1/notes/:project_id/n/:note_id` — delete note

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
        note::{CreateNote, Note, NoteWithCreator},
        project::Project,
        user::CurrentUser,
    },
};
use validator::Validate;

/// Roles allowed to mutate notes
const NOTE_MUTATORS: &[ProjectRole] = &[ProjectRole::Admin];

/// Empty set: any member of the project
const ANY_MEMBER: &[ProjectRole] = &[];

/// Create/update note request
#[derive(Debug, Deserialize, Validate)]
pub struct NoteContentRequest {
    /// Free-text content
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Lists all notes of a project
///
/// Any member may read. 404 when the project does not exist.
pub async fn get_notes(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<NoteWithCreator>>> {
    let ctx = authorize(&state.db, user.id, Some(&project_id), ANY_MEMBER).await?;

    if !Project::exists(&state.db, ctx.project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    let notes = Note::list_by_project(&state.db, ctx.project_id).await?;

    Ok(Json(notes))
}

/// Creates a note in a project
///
/// Admin only. The project-existence check and the insert are separate
/// statements; a concurrent project deletion can land between them.
pub async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<String>,
    Json(request): Json<NoteContentRequest>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let ctx = authorize(&state.db, user.id, Some(&project_id), NOTE_MUTATORS).await?;

    request.validate()?;

    if !Project::exists(&state.db, ctx.project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    let note = Note::create(
        &state.db,
        CreateNote {
            project_id: ctx.project_id,
            content: request.content,
            created_by: Some(user.id),
        },
    )
    .await?;

    tracing::info!(note_id = %note.id, project_id = %ctx.project_id, "Note created");

    Ok((StatusCode::CREATED, Json(note)))
}

/// Fetches a note with its creator projection
///
/// Any member may read.
pub async fn get_note_by_id(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, note_id)): Path<(String, String)>,
) -> ApiResult<Json<NoteWithCreator>> {
    authorize(&state.db, user.id, Some(&project_id), ANY_MEMBER).await?;
    let note_id = parse_id(&note_id, "note")?;

    let note = Note::find_by_id(&state.db, note_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    Ok(Json(note))
}

/// Replaces a note's content
///
/// Admin only. The parent project is not re-verified.
pub async fn update_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, note_id)): Path<(String, String)>,
    Json(request): Json<NoteContentRequest>,
) -> ApiResult<Json<Note>> {
    authorize(&state.db, user.id, Some(&project_id), NOTE_MUTATORS).await?;
    let note_id = parse_id(&note_id, "note")?;

    request.validate()?;

    let note = Note::update_content(&state.db, note_id, request.content)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    tracing::info!(note_id = %note.id, "Note updated");

    Ok(Json(note))
}

/// Deletes a note
///
/// Admin only.
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, note_id)): Path<(String, String)>,
) -> ApiResult<Json<Note>> {
    authorize(&state.db, user.id, Some(&project_id), NOTE_MUTATORS).await?;
    let note_id = parse_id(&note_id, "note")?;

    let note = Note::delete(&state.db, note_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    tracing::info!(note_id = %note.id, "Note deleted");

    Ok(Json(note))
}
