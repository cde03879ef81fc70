use std::fmt;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Output format selection
// ────────────────────────────────────────────────────────────────────────────

/// A single output encoding the composer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Vector page description.
    Pdf,
    /// Styled flowing document (OOXML word-processing package).
    Docx,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pdf" => Some(OutputFormat::Pdf),
            "docx" => Some(OutputFormat::Docx),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Which artifacts the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatSelector {
    Pdf,
    Docx,
    #[default]
    Both,
}

impl FormatSelector {
    /// Parses a selector label. Anything unrecognised selects both formats.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "pdf" => FormatSelector::Pdf,
            "docx" => FormatSelector::Docx,
            _ => FormatSelector::Both,
        }
    }

    /// Requested formats in generation order (PDF first).
    pub fn formats(&self) -> Vec<OutputFormat> {
        match self {
            FormatSelector::Pdf => vec![OutputFormat::Pdf],
            FormatSelector::Docx => vec![OutputFormat::Docx],
            FormatSelector::Both => vec![OutputFormat::Pdf, OutputFormat::Docx],
        }
    }
}

impl From<OutputFormat> for FormatSelector {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Pdf => FormatSelector::Pdf,
            OutputFormat::Docx => FormatSelector::Docx,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    /// Free-text range, e.g. "2018-2022".
    pub years: String,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkEntry {
    pub position: String,
    pub company: String,
    pub years: String,
    pub description: Option<String>,
}

impl WorkEntry {
    /// Description split on commas into trimmed, non-empty bullet fragments.
    pub fn bullets(&self) -> Vec<String> {
        self.description
            .as_deref()
            .map(|d| {
                d.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    /// Comma-joined skill list, kept verbatim.
    pub skills: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateEntry {
    pub name: String,
    pub organization: Option<String>,
    pub year: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Profile root
// ────────────────────────────────────────────────────────────────────────────

/// Placeholder used in artifact names when the first name is empty.
pub const FIRST_NAME_PLACEHOLDER: &str = "CV";

/// Everything the composer needs to produce one document.
///
/// Only `first_name` and `last_name` carry identity; every other scalar is optional
/// and absent values are `None` (empty strings are translated at the boundary).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub objective: Option<String>,
    pub hobbies: Option<String>,
    /// Raw photo bytes, if the caller collected one. Never serialized.
    #[serde(skip)]
    pub photo: Option<Vec<u8>>,
    pub education: Vec<EducationEntry>,
    pub work: Vec<WorkEntry>,
    pub skills: Vec<SkillGroup>,
    pub languages: Vec<LanguageEntry>,
    pub certificates: Vec<CertificateEntry>,
    pub format: FormatSelector,
}

impl ProfileRecord {
    /// First letter of first name + first letter of last name, upper-cased.
    /// Missing parts contribute nothing.
    pub fn initials(&self) -> String {
        [&self.first_name, &self.last_name]
            .iter()
            .filter_map(|part| part.trim().chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// "FIRST LAST", upper-cased, skipping empty parts.
    pub fn display_name(&self) -> String {
        [&self.first_name, &self.last_name]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .map(str::to_uppercase)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Deterministic artifact name: `<first>_<last>_CV.<ext>`.
    pub fn artifact_name(&self, format: OutputFormat) -> String {
        let first = match self.first_name.trim() {
            "" => FIRST_NAME_PLACEHOLDER.to_string(),
            name => sanitize_file_part(name),
        };
        let last = sanitize_file_part(self.last_name.trim());
        format!("{first}_{last}_CV.{}", format.extension())
    }
}

/// Replaces characters that would break a file name or a Content-Disposition header.
fn sanitize_file_part(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn named(first: &str, last: &str) -> ProfileRecord {
        ProfileRecord {
            first_name: first.to_string(),
            last_name: last.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_artifact_name_uses_first_and_last() {
        let profile = named("Ali", "Vali");
        assert_eq!(profile.artifact_name(OutputFormat::Pdf), "Ali_Vali_CV.pdf");
        assert_eq!(profile.artifact_name(OutputFormat::Docx), "Ali_Vali_CV.docx");
    }

    #[test]
    fn test_artifact_name_placeholder_for_empty_first_name() {
        let profile = named("", "Vali");
        assert_eq!(profile.artifact_name(OutputFormat::Pdf), "CV_Vali_CV.pdf");
    }

    #[test]
    fn test_artifact_name_strips_path_characters() {
        let profile = named("A/B", "C\"D");
        assert_eq!(profile.artifact_name(OutputFormat::Pdf), "A_B_C_D_CV.pdf");
    }

    #[test]
    fn test_initials_handles_missing_parts() {
        assert_eq!(named("ali", "vali").initials(), "AV");
        assert_eq!(named("ali", "").initials(), "A");
        assert_eq!(named("", "").initials(), "");
        assert_eq!(named("ёлка", "юрий").initials(), "ЁЮ");
    }

    #[test]
    fn test_display_name_uppercases_and_skips_empty() {
        assert_eq!(named("Ali", "Vali").display_name(), "ALI VALI");
        assert_eq!(named("", "Vali").display_name(), "VALI");
    }

    #[test]
    fn test_work_bullets_split_on_commas() {
        let entry = WorkEntry {
            position: "Dev".into(),
            company: "Acme".into(),
            years: "2020".into(),
            description: Some("Built APIs, , Led team ,Shipped".into()),
        };
        assert_eq!(entry.bullets(), vec!["Built APIs", "Led team", "Shipped"]);
    }

    #[test]
    fn test_format_selector_defaults_to_both() {
        assert_eq!(FormatSelector::parse("PDF"), FormatSelector::Pdf);
        assert_eq!(FormatSelector::parse("docx"), FormatSelector::Docx);
        assert_eq!(FormatSelector::parse("whatever"), FormatSelector::Both);
        assert_eq!(
            FormatSelector::Both.formats(),
            vec![OutputFormat::Pdf, OutputFormat::Docx]
        );
    }
}
