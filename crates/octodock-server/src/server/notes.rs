//! `/notes` handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::storage::{Note, NoteChanges};

use super::error::ApiError;
use super::state::AppState;

/// `GET /notes`
pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.db.list_notes().await?))
}

/// `GET /notes/{id}`
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.db.get_note(&id).await?))
}

/// `POST /notes`
#[instrument(skip_all)]
pub async fn create_note(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let Json(body) = payload?;
    let fields = as_object(&body)?;
    let title = validate_title(fields.get("title"))
        .ok_or_else(|| invalid("Title is required and must be a non-empty string"))?;
    let content = validate_content(fields.get("content"))
        .ok_or_else(|| invalid("Content must be a string"))?;

    let id = uuid::Uuid::new_v4().to_string();
    let note = state.db.create_note(&id, &title, &content).await?;
    info!(note_id = %note.id, "Note created");
    Ok((StatusCode::CREATED, Json(note)))
}

/// `PUT /notes/{id}`
///
/// Partial update: absent fields are left as they are.
#[instrument(skip(state, payload))]
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Note>, ApiError> {
    let Json(body) = payload?;
    let fields = as_object(&body)?;

    let mut changes = NoteChanges::default();
    if let Some(raw) = fields.get("title") {
        changes.title = Some(
            validate_title(Some(raw)).ok_or_else(|| invalid("Title must be a non-empty string"))?,
        );
    }
    if let Some(raw) = fields.get("content") {
        changes.content = Some(
            validate_content(Some(raw)).ok_or_else(|| invalid("Content must be a string"))?,
        );
    }

    let note = state.db.update_note(&id, &changes).await?;
    info!(note_id = %note.id, "Note updated");
    Ok(Json(note))
}

/// `DELETE /notes/{id}`
#[instrument(skip(state))]
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.db.delete_note(&id).await? {
        return Err(ApiError::NotFound("Note not found".into()));
    }
    info!(note_id = %id, "Note deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn invalid(message: &str) -> ApiError {
    ApiError::InvalidInput(message.to_string())
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ApiError> {
    body.as_object()
        .ok_or_else(|| invalid("Note data must be an object"))
}

/// Trimmed title, if it is a non-blank string.
fn validate_title(raw: Option<&Value>) -> Option<String> {
    raw.and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn validate_content(raw: Option<&Value>) -> Option<String> {
    raw.and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn title_is_trimmed_and_must_be_text() {
        assert_eq!(validate_title(Some(&json!("  Hi  "))), Some("Hi".into()));
        assert_eq!(validate_title(Some(&json!("   "))), None);
        assert_eq!(validate_title(Some(&json!(42))), None);
        assert_eq!(validate_title(None), None);
    }

    #[test]
    fn content_may_be_empty_but_must_be_text() {
        assert_eq!(validate_content(Some(&json!(""))), Some(String::new()));
        assert_eq!(validate_content(Some(&json!(["a"]))), None);
        assert_eq!(validate_content(None), None);
    }
}
