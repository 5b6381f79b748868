/// Database models for TaskHub
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and the public identity projection
/// - `project`: Projects (existence checks; lifecycle is owned elsewhere)
/// - `membership`: Per-project user roles, the source of truth for authorization
/// - `task`: Tasks with attachments and the denormalized detail view
/// - `subtask`: Subtasks owned by tasks
/// - `note`: Free-text project notes

pub mod membership;
pub mod note;
pub mod project;
pub mod subtask;
pub mod task;
pub mod user;
