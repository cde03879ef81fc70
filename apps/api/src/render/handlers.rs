use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::layout::theme::ThemeKind;
use crate::profile::models::{OutputFormat, ProfileRecord};
use crate::profile::proficiency::{self, DotIndicator};
use crate::profile::ProfileRequest;
use crate::render::compose::ComposeOutcome;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatStatus {
    Success,
    Failure,
}

#[derive(Debug, Serialize)]
pub struct FormatReport {
    pub format: OutputFormat,
    pub status: FormatStatus,
    pub filename: String,
    pub size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComposeReport {
    pub compose_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub theme: ThemeKind,
    pub outcomes: Vec<FormatReport>,
}

#[derive(Debug, Deserialize)]
pub struct LevelPreviewRequest {
    pub labels: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LevelPreviewResponse {
    pub scale: u8,
    pub ranks: BTreeMap<String, u8>,
    pub dots: BTreeMap<String, String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/cv
pub async fn handle_compose(
    State(state): State<AppState>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<ComposeReport>, AppError> {
    let theme = req.theme.unwrap_or(state.config.default_theme);
    let record = intake(req, &state)?;

    let outcome = compose_blocking(&state, record, theme).await?;
    let report = build_report(outcome, theme, state.config.inline_artifacts);
    info!(
        compose_id = %report.compose_id,
        succeeded = report.outcomes.iter().filter(|o| o.status == FormatStatus::Success).count(),
        requested = report.outcomes.len(),
        "compose finished"
    );
    Ok(Json(report))
}

/// POST /api/v1/cv/:format
pub async fn handle_download(
    State(state): State<AppState>,
    Path(format): Path<String>,
    Json(req): Json<ProfileRequest>,
) -> Result<Response, AppError> {
    let format = OutputFormat::parse(&format)
        .ok_or_else(|| AppError::NotFound(format!("Unknown output format '{format}'")))?;
    let theme = req.theme.unwrap_or(state.config.default_theme);
    let mut record = intake(req, &state)?;
    record.format = format.into();

    let mut outcome = compose_blocking(&state, record, theme).await?;
    let result = outcome
        .take(format)
        .ok_or_else(|| AppError::Render(format!("{format} was not produced")))?;
    let bytes = result.result.map_err(|e| AppError::Render(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&result.filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/v1/cv/preview/levels
pub async fn handle_levels(
    State(state): State<AppState>,
    Json(req): Json<LevelPreviewRequest>,
) -> Json<LevelPreviewResponse> {
    let scale = state.config.default_theme.theme().proficiency_scale;
    let mut ranks = BTreeMap::new();
    let mut dots = BTreeMap::new();
    for label in req.labels {
        let rank = proficiency::rank(&label);
        dots.insert(label.clone(), DotIndicator::new(rank, scale).glyphs());
        ranks.insert(label, rank);
    }
    Json(LevelPreviewResponse { scale, ranks, dots })
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// First and last name are the only fields the service insists on.
fn intake(req: ProfileRequest, state: &AppState) -> Result<ProfileRecord, AppError> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(AppError::Validation(
            "first_name and last_name are required".to_string(),
        ));
    }
    req.into_record(state.config.max_photo_bytes)
}

/// Runs the synchronous composer on the blocking pool.
async fn compose_blocking(
    state: &AppState,
    record: ProfileRecord,
    theme: ThemeKind,
) -> Result<ComposeOutcome, AppError> {
    let composer = state.composer.clone();
    tokio::task::spawn_blocking(move || composer.compose(&record, theme.theme()))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in compose: {e}")))
}

fn build_report(outcome: ComposeOutcome, theme: ThemeKind, inline: bool) -> ComposeReport {
    let outcomes = outcome
        .results
        .into_iter()
        .map(|r| match r.result {
            Ok(bytes) => FormatReport {
                format: r.format,
                status: FormatStatus::Success,
                filename: r.filename,
                size_bytes: bytes.len(),
                content_base64: inline.then(|| STANDARD.encode(&bytes)),
                error: None,
            },
            Err(e) => FormatReport {
                format: r.format,
                status: FormatStatus::Failure,
                filename: r.filename,
                size_bytes: 0,
                content_base64: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    ComposeReport {
        compose_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        theme,
        outcomes,
    }
}

/// `attachment` disposition with an ASCII fallback name and an RFC 5987 UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() { c } else { '_' })
        .collect();
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect();
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::compose::{FormatResult, RenderError};
    use bytes::Bytes;

    fn outcome() -> ComposeOutcome {
        ComposeOutcome {
            results: vec![
                FormatResult {
                    format: OutputFormat::Pdf,
                    filename: "Ali_Vali_CV.pdf".into(),
                    result: Ok(Bytes::from_static(b"%PDF")),
                },
                FormatResult {
                    format: OutputFormat::Docx,
                    filename: "Ali_Vali_CV.docx".into(),
                    result: Err(RenderError::MissingWriter(OutputFormat::Docx)),
                },
            ],
        }
    }

    #[test]
    fn test_report_carries_partial_success() {
        let report = build_report(outcome(), ThemeKind::Europass, true);
        assert_eq!(report.outcomes[0].status, FormatStatus::Success);
        assert_eq!(report.outcomes[0].size_bytes, 4);
        assert_eq!(report.outcomes[0].content_base64.as_deref(), Some("JVBERg=="));
        assert_eq!(report.outcomes[1].status, FormatStatus::Failure);
        assert!(report.outcomes[1].error.as_deref().unwrap().contains("docx"));
    }

    #[test]
    fn test_report_omits_content_when_not_inline() {
        let report = build_report(outcome(), ThemeKind::Europass, false);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["outcomes"][0].get("content_base64").is_none());
        assert_eq!(json["outcomes"][0]["status"], "success");
        assert_eq!(json["outcomes"][1]["status"], "failure");
        assert_eq!(json["theme"], "europass");
    }

    #[test]
    fn test_content_disposition_is_ascii_safe() {
        assert_eq!(
            content_disposition("Ali_Vali_CV.pdf"),
            "attachment; filename=\"Ali_Vali_CV.pdf\"; filename*=UTF-8''Ali_Vali_CV.pdf"
        );
        let header = content_disposition("Алі_CV.pdf");
        assert!(header.is_ascii());
        assert!(header.contains("filename*=UTF-8''%D0%90"));
    }
}
