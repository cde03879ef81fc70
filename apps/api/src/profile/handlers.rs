use axum::Json;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::profile::intake::{EntryCategory, ProfileDraft, ProfileField};
use crate::profile::models::FormatSelector;
use crate::profile::ProfileRequest;

/// One step of a collecting dialogue, replayed in order.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntakeEvent {
    SetField { field: ProfileField, value: String },
    Append { category: EntryCategory, message: String },
    Photo { base64: String },
    /// Free-text answer; anything other than `pdf` or `docx` selects both.
    Format { answer: String },
}

#[derive(Debug, Deserialize)]
pub struct IntakeRequest {
    pub events: Vec<IntakeEvent>,
}

#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    /// Lines kept across all `append` events.
    pub appended_lines: usize,
    /// Ready to post to `/api/v1/cv`.
    pub profile: ProfileRequest,
}

/// POST /api/v1/cv/intake
pub async fn handle_intake(
    Json(req): Json<IntakeRequest>,
) -> Result<Json<IntakeResponse>, AppError> {
    let mut draft = ProfileDraft::new();
    let mut appended_lines = 0;

    for event in req.events {
        match event {
            IntakeEvent::SetField { field, value } => draft.set_field(field, &value),
            IntakeEvent::Append { category, message } => {
                appended_lines += draft.append_message(category, &message);
            }
            IntakeEvent::Photo { base64 } => {
                let bytes = STANDARD.decode(base64.trim()).map_err(|e| {
                    AppError::Validation(format!("photo is not valid base64: {e}"))
                })?;
                draft.set_photo(&bytes);
            }
            IntakeEvent::Format { answer } => draft.set_format(FormatSelector::parse(&answer)),
        }
    }

    Ok(Json(IntakeResponse {
        appended_lines,
        profile: draft.finish(),
    }))
}
