/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `tasks`: Task and subtask endpoints, scoped by project
/// - `notes`: Project note endpoints

pub mod health;
pub mod notes;
pub mod tasks;

use crate::error::ApiError;
use uuid::Uuid;

/// Parses a path identifier, mapping malformed input to a 400
///
/// Used for child-entity ids (tasks, subtasks, notes). Project ids go
/// through the permission gate instead, which performs the same check
/// before any store access.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {} id", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "task").unwrap(), id);

        let err = parse_id("nope", "task").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
