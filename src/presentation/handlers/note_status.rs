use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::VoiceNoteId;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct NoteStatusResponse {
    pub id: String,
    pub state: String,
    pub detected_language: Option<String>,
    pub chosen_language: Option<String>,
    pub has_summary: bool,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state))]
pub async fn note_status_handler(
    State(state): State<AppState>,
    Path(note_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&note_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid note ID: {}", note_id),
                }),
            )
                .into_response();
        }
    };

    match state.notes.get_by_id(VoiceNoteId::from_uuid(uuid)).await {
        Ok(Some(note)) => {
            let response = NoteStatusResponse {
                id: note.id.to_string(),
                state: note.state.as_str().to_string(),
                detected_language: note.detected_language.map(|l| l.code().to_string()),
                chosen_language: note.chosen_language.map(|l| l.code().to_string()),
                has_summary: note.summary.is_some(),
                error_message: note.error_message,
                created_at: note.created_at.to_rfc3339(),
                updated_at: note.updated_at.to_rfc3339(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Note not found: {}", note_id),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch note status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch note: {}", e),
                }),
            )
                .into_response()
        }
    }
}
