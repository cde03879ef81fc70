//! Document Composer: profile in, one independent result per requested format out.
//!
//! The plan (both panels plus the portrait) is built once and shared by every
//! writer. A writer failing only fails its own format.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::layout::theme::Theme;
use crate::profile::models::{OutputFormat, ProfileRecord};
use crate::render::blocks::{plan_document, DocumentPlan};
use crate::render::docx::DocxWriter;
use crate::render::pdf::PdfWriter;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("DOCX archive failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("DOCX markup failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no writer registered for {0}")]
    MissingWriter(OutputFormat),
}

/// One output encoding. Implementations are stateless and shared across requests.
pub trait DocumentWriter: Send + Sync {
    fn format(&self) -> OutputFormat;
    fn write(&self, plan: &DocumentPlan, theme: &Theme) -> Result<Vec<u8>, RenderError>;
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub format: OutputFormat,
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Debug)]
pub struct FormatResult {
    pub format: OutputFormat,
    pub filename: String,
    pub result: Result<Bytes, RenderError>,
}

#[derive(Debug, Default)]
pub struct ComposeOutcome {
    pub results: Vec<FormatResult>,
}

impl ComposeOutcome {
    /// Takes the result for `format` out of the outcome.
    pub fn take(&mut self, format: OutputFormat) -> Option<FormatResult> {
        let index = self.results.iter().position(|r| r.format == format)?;
        Some(self.results.remove(index))
    }

    #[cfg(test)]
    pub fn artifact(&self, format: OutputFormat) -> Option<Artifact> {
        self.results.iter().find(|r| r.format == format).and_then(|r| {
            r.result.as_ref().ok().map(|bytes| Artifact {
                format,
                filename: r.filename.clone(),
                bytes: bytes.clone(),
            })
        })
    }

    #[cfg(test)]
    pub fn succeeded(&self, format: OutputFormat) -> bool {
        self.results
            .iter()
            .any(|r| r.format == format && r.result.is_ok())
    }
}

pub struct Composer {
    writers: Vec<Arc<dyn DocumentWriter>>,
}

impl Composer {
    pub fn new(writers: Vec<Arc<dyn DocumentWriter>>) -> Self {
        Composer { writers }
    }

    /// PDF and DOCX writers.
    pub fn standard() -> Self {
        Composer::new(vec![Arc::new(PdfWriter), Arc::new(DocxWriter)])
    }

    /// Replaces the writer for the same format, or adds it.
    #[cfg(test)]
    pub fn with_writer(mut self, writer: Arc<dyn DocumentWriter>) -> Self {
        self.writers.retain(|w| w.format() != writer.format());
        self.writers.push(writer);
        self
    }

    /// Composes every format the profile's selector asks for.
    ///
    /// Synchronous and CPU-bound: async callers should run it on the blocking pool.
    pub fn compose(&self, profile: &ProfileRecord, theme: &Theme) -> ComposeOutcome {
        let plan = plan_document(profile, theme);
        debug!(
            sidebar = ?plan.sidebar.sections(),
            main = ?plan.main.sections(),
            theme = ?theme.kind,
            "document planned"
        );

        let results = profile
            .format
            .formats()
            .into_iter()
            .map(|format| {
                let filename = profile.artifact_name(format);
                let result = self
                    .writer(format)
                    .and_then(|w| w.write(&plan, theme))
                    .map(Bytes::from);
                match &result {
                    Ok(bytes) => info!(%format, %filename, size = bytes.len(), "artifact composed"),
                    Err(e) => error!(%format, %filename, error = %e, "artifact failed"),
                }
                FormatResult {
                    format,
                    filename,
                    result,
                }
            })
            .collect();

        ComposeOutcome { results }
    }

    fn writer(&self, format: OutputFormat) -> Result<&dyn DocumentWriter, RenderError> {
        self.writers
            .iter()
            .find(|w| w.format() == format)
            .map(|w| w.as_ref())
            .ok_or(RenderError::MissingWriter(format))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
