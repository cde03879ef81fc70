//! Record Parser: turns delimited free-text lines into typed records.
//!
//! Parsing is permissive: a line that does not carry the minimum number of fields
//! for its category is dropped silently, and no partial record is ever emitted.
//! Pipe-delimited categories ignore fields past the ones they use. Skills split on
//! the first colon only. A blank line has zero fields.

use crate::profile::models::{
    CertificateEntry, EducationEntry, LanguageEntry, SkillGroup, WorkEntry,
};

const FIELD_DELIMITER: char = '|';
const SKILL_DELIMITER: char = ':';

/// A record built from the trimmed fields of one pipe-delimited line.
pub trait FromFields: Sized {
    /// Lines with fewer fields than this are dropped.
    const MIN_FIELDS: usize;

    /// Builds the record. `fields.len() >= MIN_FIELDS` is guaranteed by the caller.
    fn from_fields(fields: &[&str]) -> Self;
}

/// Parses pipe-delimited lines into records, preserving input order.
pub fn parse_records<T, S>(lines: &[S]) -> Vec<T>
where
    T: FromFields,
    S: AsRef<str>,
{
    lines
        .iter()
        .filter_map(|line| {
            let fields = split_fields(line.as_ref())?;
            (fields.len() >= T::MIN_FIELDS).then(|| T::from_fields(&fields))
        })
        .collect()
}

pub fn parse_education<S: AsRef<str>>(lines: &[S]) -> Vec<EducationEntry> {
    parse_records(lines)
}

pub fn parse_work<S: AsRef<str>>(lines: &[S]) -> Vec<WorkEntry> {
    parse_records(lines)
}

pub fn parse_languages<S: AsRef<str>>(lines: &[S]) -> Vec<LanguageEntry> {
    parse_records(lines)
}

pub fn parse_certificates<S: AsRef<str>>(lines: &[S]) -> Vec<CertificateEntry> {
    parse_records(lines)
}

/// Parses `category: skill, skill` lines. Only the first colon separates; later
/// colons stay in the skills value. Lines without a colon are dropped.
pub fn parse_skills<S: AsRef<str>>(lines: &[S]) -> Vec<SkillGroup> {
    lines
        .iter()
        .filter_map(|line| {
            let (category, skills) = line.as_ref().split_once(SKILL_DELIMITER)?;
            Some(SkillGroup {
                category: category.trim().to_string(),
                skills: skills.trim().to_string(),
            })
        })
        .collect()
}

fn split_fields(line: &str) -> Option<Vec<&str>> {
    if line.trim().is_empty() {
        return None;
    }
    Some(line.split(FIELD_DELIMITER).map(str::trim).collect())
}

fn optional(fields: &[&str], idx: usize) -> Option<String> {
    fields
        .get(idx)
        .filter(|f| !f.is_empty())
        .map(|f| f.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Per-category field mapping
// ────────────────────────────────────────────────────────────────────────────

impl FromFields for EducationEntry {
    const MIN_FIELDS: usize = 3;

    fn from_fields(fields: &[&str]) -> Self {
        EducationEntry {
            degree: fields[0].to_string(),
            institution: fields[1].to_string(),
            years: fields[2].to_string(),
            gpa: optional(fields, 3),
        }
    }
}

impl FromFields for WorkEntry {
    const MIN_FIELDS: usize = 3;

    fn from_fields(fields: &[&str]) -> Self {
        WorkEntry {
            position: fields[0].to_string(),
            company: fields[1].to_string(),
            years: fields[2].to_string(),
            description: optional(fields, 3),
        }
    }
}

impl FromFields for LanguageEntry {
    const MIN_FIELDS: usize = 2;

    fn from_fields(fields: &[&str]) -> Self {
        LanguageEntry {
            language: fields[0].to_string(),
            level: fields[1].to_string(),
        }
    }
}

impl FromFields for CertificateEntry {
    const MIN_FIELDS: usize = 1;

    fn from_fields(fields: &[&str]) -> Self {
        CertificateEntry {
            name: fields[0].to_string(),
            organization: optional(fields, 1),
            year: optional(fields, 2),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_full_line() {
        let parsed = parse_education(&["Bachelor|TUIT|2018-2022|3.8"]);
        assert_eq!(
            parsed,
            vec![EducationEntry {
                degree: "Bachelor".into(),
                institution: "TUIT".into(),
                years: "2018-2022".into(),
                gpa: Some("3.8".into()),
            }]
        );
    }

    #[test]
    fn test_education_single_field_is_dropped() {
        assert!(parse_education(&["onlyonefield"]).is_empty());
        assert!(parse_education(&["a|b"]).is_empty());
    }

    #[test]
    fn test_fields_are_trimmed_and_extra_fields_ignored() {
        let parsed = parse_education(&["  MSc | MIT |2020-2022 | 4.0 | honours | extra "]);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].institution, "MIT");
        assert_eq!(parsed[0].gpa.as_deref(), Some("4.0"));
    }

    #[test]
    fn test_missing_gpa_is_none() {
        let parsed = parse_education(&["BSc|Uni|2019"]);
        assert_eq!(parsed[0].gpa, None);
        let parsed = parse_education(&["BSc|Uni|2019|"]);
        assert_eq!(parsed[0].gpa, None);
    }

    #[test]
    fn test_parse_is_order_preserving_and_counts_qualifying_lines() {
        let lines = vec![
            "Dev|Acme|2020-2021|Built APIs",
            "garbage",
            "Lead|Beta|2021-2023",
            "",
            "Lead|Beta|2021-2023",
        ];
        let parsed = parse_work(&lines);
        assert_eq!(parsed.len(), 3, "duplicates are kept, invalid lines dropped");
        assert_eq!(parsed[0].company, "Acme");
        assert_eq!(parsed[1].company, "Beta");
        assert_eq!(parsed[2].company, "Beta");
        assert_eq!(parsed[0].description.as_deref(), Some("Built APIs"));
    }

    #[test]
    fn test_skills_split_on_first_colon_only() {
        let parsed = parse_skills(&["Programming: Python, Go", "Tools: k8s: helm", "no colon"]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].category, "Programming");
        assert_eq!(parsed[0].skills, "Python, Go");
        assert_eq!(parsed[1].category, "Tools");
        assert_eq!(parsed[1].skills, "k8s: helm");
    }

    #[test]
    fn test_languages_need_two_fields() {
        let parsed = parse_languages(&["English|C1", "Uzbek", "Russian | B2 | extra"]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].level, "C1");
        assert_eq!(parsed[1].language, "Russian");
        assert_eq!(parsed[1].level, "B2");
    }

    #[test]
    fn test_certificates_need_one_field() {
        let parsed = parse_certificates(&["AWS SAA", "CKA|CNCF|2023", "   "]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].organization, None);
        assert_eq!(parsed[0].year, None);
        assert_eq!(parsed[1].organization.as_deref(), Some("CNCF"));
        assert_eq!(parsed[1].year.as_deref(), Some("2023"));
    }

    #[test]
    fn test_owned_strings_accepted() {
        let lines: Vec<String> = vec!["English|C1".to_string()];
        assert_eq!(parse_languages(&lines).len(), 1);
    }
}
