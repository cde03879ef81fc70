//! Boundary between a collecting front end and the composer.
//!
//! Front ends hand over empty strings and raw delimited lines; this module turns
//! them into a [`ProfileRecord`] with `None` for absent values and parsed lists.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::theme::ThemeKind;
use crate::profile::models::{FormatSelector, ProfileRecord};
use crate::profile::parser::{
    parse_certificates, parse_education, parse_languages, parse_skills, parse_work,
};

// ────────────────────────────────────────────────────────────────────────────
// Request shape
// ────────────────────────────────────────────────────────────────────────────

/// A profile as a caller submits it: scalars may be empty, lists are raw lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(alias = "dob")]
    pub date_of_birth: String,
    pub nationality: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
    pub objective: String,
    pub hobbies: String,
    /// Standard base64 photo bytes (any format the image decoder understands).
    pub photo_base64: Option<String>,
    pub education_list: Vec<String>,
    pub work_list: Vec<String>,
    pub skills_list: Vec<String>,
    pub lang_list: Vec<String>,
    pub cert_list: Vec<String>,
    pub format: FormatSelector,
    pub theme: Option<ThemeKind>,
}

impl ProfileRequest {
    /// Converts the request into a record. Fails only on an undecodable or oversized
    /// photo payload; a photo that decodes as base64 but not as an image is kept and
    /// later degrades to the initials badge.
    pub fn into_record(self, max_photo_bytes: usize) -> Result<ProfileRecord, AppError> {
        let photo = match self.photo_base64.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(encoded) => {
                let bytes = STANDARD.decode(encoded).map_err(|e| {
                    AppError::Validation(format!("photo_base64 is not valid base64: {e}"))
                })?;
                if bytes.len() > max_photo_bytes {
                    return Err(AppError::Validation(format!(
                        "photo is {} bytes, limit is {max_photo_bytes}",
                        bytes.len()
                    )));
                }
                Some(bytes)
            }
        };

        Ok(ProfileRecord {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            date_of_birth: non_empty(self.date_of_birth),
            nationality: non_empty(self.nationality),
            email: non_empty(self.email),
            phone: non_empty(self.phone),
            address: non_empty(self.address),
            linkedin: non_empty(self.linkedin),
            github: non_empty(self.github),
            website: non_empty(self.website),
            objective: non_empty(self.objective),
            hobbies: non_empty(self.hobbies),
            photo,
            education: parse_education(&self.education_list),
            work: parse_work(&self.work_list),
            skills: parse_skills(&self.skills_list),
            languages: parse_languages(&self.lang_list),
            certificates: parse_certificates(&self.cert_list),
            format: self.format,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Incremental accumulation
// ────────────────────────────────────────────────────────────────────────────

/// List categories a dialogue collects over several messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryCategory {
    Education,
    Work,
    Skills,
    Languages,
    Certificates,
}

impl EntryCategory {
    fn marker(&self) -> char {
        match self {
            EntryCategory::Skills => ':',
            _ => '|',
        }
    }
}

/// Splits one chat message into candidate lines for `category`.
///
/// A message may carry several entries, one per line. Only lines containing the
/// category's delimiter survive; full field validation happens in the parser.
pub fn split_message(category: EntryCategory, message: &str) -> Vec<String> {
    let marker = category.marker();
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains(marker))
        .map(str::to_string)
        .collect()
}

/// Scalar fields a dialogue sets one message at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FirstName,
    LastName,
    DateOfBirth,
    Nationality,
    Email,
    Phone,
    Address,
    Linkedin,
    Github,
    Website,
    Objective,
    Hobbies,
}

/// Per-session accumulator. Lists grow in insertion order without deduplication
/// until [`ProfileDraft::finish`] hands the request to the composer.
#[derive(Debug, Default)]
pub struct ProfileDraft {
    request: ProfileRequest,
}

impl ProfileDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_field(&mut self, field: ProfileField, value: &str) {
        let value = value.trim().to_string();
        let r = &mut self.request;
        let slot = match field {
            ProfileField::FirstName => &mut r.first_name,
            ProfileField::LastName => &mut r.last_name,
            ProfileField::DateOfBirth => &mut r.date_of_birth,
            ProfileField::Nationality => &mut r.nationality,
            ProfileField::Email => &mut r.email,
            ProfileField::Phone => &mut r.phone,
            ProfileField::Address => &mut r.address,
            ProfileField::Linkedin => &mut r.linkedin,
            ProfileField::Github => &mut r.github,
            ProfileField::Website => &mut r.website,
            ProfileField::Objective => &mut r.objective,
            ProfileField::Hobbies => &mut r.hobbies,
        };
        *slot = value;
    }

    pub fn set_photo(&mut self, bytes: &[u8]) {
        self.request.photo_base64 = Some(STANDARD.encode(bytes));
    }

    pub fn set_format(&mut self, format: FormatSelector) {
        self.request.format = format;
    }

    /// Appends every candidate line of `message`; returns how many were added.
    pub fn append_message(&mut self, category: EntryCategory, message: &str) -> usize {
        let lines = split_message(category, message);
        let added = lines.len();
        let target = match category {
            EntryCategory::Education => &mut self.request.education_list,
            EntryCategory::Work => &mut self.request.work_list,
            EntryCategory::Skills => &mut self.request.skills_list,
            EntryCategory::Languages => &mut self.request.lang_list,
            EntryCategory::Certificates => &mut self.request.cert_list,
        };
        target.extend(lines);
        added
    }

    pub fn finish(self) -> ProfileRequest {
        self.request
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
