use anyhow::{Context, Result};

use crate::layout::theme::ThemeKind;

const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Theme used when a request does not name one.
    pub default_theme: ThemeKind,
    /// Decoded photo payloads above this size are rejected before image decode.
    pub max_photo_bytes: usize,
    /// Whether the JSON compose report embeds artifacts as base64.
    pub inline_artifacts: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_theme = match lookup("CV_THEME") {
            Some(raw) => ThemeKind::parse(&raw)
                .with_context(|| format!("CV_THEME must be 'europass' or 'midnight', got '{raw}'"))?,
            None => ThemeKind::default(),
        };

        Ok(Config {
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            default_theme,
            max_photo_bytes: match lookup("CV_MAX_PHOTO_BYTES") {
                Some(raw) => raw
                    .parse::<usize>()
                    .context("CV_MAX_PHOTO_BYTES must be a byte count")?,
                None => DEFAULT_MAX_PHOTO_BYTES,
            },
            inline_artifacts: match lookup("CV_INLINE_ARTIFACTS") {
                Some(raw) => parse_bool(&raw)
                    .with_context(|| format!("CV_INLINE_ARTIFACTS must be a boolean, got '{raw}'"))?,
                None => true,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            default_theme: ThemeKind::default(),
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
            inline_artifacts: true,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
