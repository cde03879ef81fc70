//! Proficiency Mapper: free-text language level → rank on a fixed 1..=6 scale.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Rank assigned to any label the table does not know.
pub const DEFAULT_RANK: u8 = 3;
pub const MIN_RANK: u8 = 1;

/// CEFR codes, "native" in three languages, and English descriptive levels.
const LEVELS: &[(&str, u8)] = &[
    ("a1", 1),
    ("a2", 2),
    ("b1", 3),
    ("b2", 4),
    ("c1", 5),
    ("c2", 6),
    ("native", 6),
    ("ona tili", 6),
    ("родной", 6),
    ("beginner", 1),
    ("elementary", 2),
    ("intermediate", 3),
    ("upper intermediate", 4),
    ("advanced", 5),
    ("proficient", 6),
];

static LEVEL_TABLE: Lazy<HashMap<&'static str, u8>> =
    Lazy::new(|| LEVELS.iter().copied().collect());

/// Maps a level label to a rank in `[1, 6]`. Trimmed and lower-cased before lookup;
/// unknown labels map to [`DEFAULT_RANK`].
pub fn rank(level_label: &str) -> u8 {
    let key = level_label.trim().to_lowercase();
    LEVEL_TABLE.get(key.as_str()).copied().unwrap_or(DEFAULT_RANK)
}

/// Filled/empty split of a dot indicator on a given scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotIndicator {
    pub filled: u8,
    pub empty: u8,
}

impl DotIndicator {
    /// Clamps `rank` to `1..=scale` so the empty count can never go negative.
    pub fn new(rank: u8, scale: u8) -> Self {
        let scale = scale.max(1);
        let filled = rank.clamp(MIN_RANK, scale);
        DotIndicator {
            filled,
            empty: scale - filled,
        }
    }

    pub fn scale(&self) -> u8 {
        self.filled + self.empty
    }

    /// Text rendition for surfaces that draw dots as glyphs.
    pub fn glyphs(&self) -> String {
        let mut out = "●".repeat(self.filled as usize);
        out.push_str(&"○".repeat(self.empty as usize));
        out
    }
}
