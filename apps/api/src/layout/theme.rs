//! Theme: colors, geometry, and precomputed text styles for one visual variant.
//!
//! Themes are built once per process and handed out as `&'static Theme`.
//! Every renderer reads its constants from here; nothing else carries literals.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::{FontFace, FontMeasure};

/// Points per millimetre.
pub const MM: f32 = 72.0 / 25.4;
/// Twentieths of a point per centimetre (DOCX geometry unit).
pub const TWIPS_PER_CM: f32 = 566.93;
/// English Metric Units per millimetre (DrawingML geometry unit).
pub const EMU_PER_MM: i64 = 36_000;

// ────────────────────────────────────────────────────────────────────────────
// Color
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);

    pub const fn hex(value: u32) -> Rgb {
        Rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Components in 0.0..=1.0 for PDF color operators.
    pub fn unit(&self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }

    /// Upper-case `RRGGBB`, as OOXML expects.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Styles
// ────────────────────────────────────────────────────────────────────────────

/// Precomputed font/size/color record passed as plain data into text flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub color: Rgb,
    /// Vertical advance per line, in points.
    pub leading: f32,
}

impl TextStyle {
    pub const fn new(face: FontFace, size: f32, color: Rgb, leading: f32) -> Self {
        TextStyle {
            face,
            size,
            color,
            leading,
        }
    }

    pub fn measure(&self) -> FontMeasure {
        FontMeasure::new(self.face, self.size)
    }

    pub fn with_color(self, color: Rgb) -> Self {
        TextStyle { color, ..self }
    }
}

/// Section header appearance: title text, rule underneath, spacing around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderStyle {
    pub text: TextStyle,
    pub rule_color: Rgb,
    pub rule_width: f32,
    pub space_before: f32,
    pub space_after: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub sidebar_background: Rgb,
    pub main_background: Rgb,
    /// Gold-like accent used for sidebar headers, labels, dots, and the portrait ring.
    pub accent: Rgb,
    pub sidebar_text: Rgb,
    /// Fill of the initials badge.
    pub badge: Rgb,
    pub heading: Rgb,
    pub name: Rgb,
    pub body: Rgb,
    pub muted: Rgb,
}

/// Text styles for the two panels. Sidebar styles are light-on-dark,
/// main styles dark-on-light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Typography {
    pub sidebar_header: HeaderStyle,
    pub sidebar_label: TextStyle,
    pub sidebar_value: TextStyle,
    pub language_name: TextStyle,
    pub language_level: TextStyle,
    pub initials: TextStyle,
    pub main_header: HeaderStyle,
    pub name: TextStyle,
    pub objective: TextStyle,
    pub entry_title: TextStyle,
    pub entry_meta: TextStyle,
    pub body: TextStyle,
}

/// Vector page geometry, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub sidebar_width: f32,
    pub sidebar_pad_left: f32,
    pub sidebar_pad_right: f32,
    pub main_pad: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub portrait_diameter: f32,
    pub portrait_ring: f32,
    pub dot_radius: f32,
    pub dot_gap: f32,
}

impl PageGeometry {
    pub fn main_width(&self) -> f32 {
        self.page_width - self.sidebar_width
    }

    pub fn sidebar_text_width(&self) -> f32 {
        self.sidebar_width - self.sidebar_pad_left - self.sidebar_pad_right
    }

    pub fn main_text_width(&self) -> f32 {
        self.main_width() - 2.0 * self.main_pad
    }

    /// Lowest y (top-down) content may reach before it counts as overflow.
    pub fn content_bottom(&self) -> f32 {
        self.page_height - self.bottom_margin
    }
}

/// Flowing document geometry, in twips unless noted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentGeometry {
    pub page_width: u32,
    pub page_height: u32,
    pub sidebar_width: u32,
    pub main_width: u32,
    pub indent: u32,
    /// Portrait edge length in millimetres.
    pub portrait_mm: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeKind {
    #[default]
    Europass,
    Midnight,
}

impl ThemeKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "europass" => Some(ThemeKind::Europass),
            "midnight" => Some(ThemeKind::Midnight),
            _ => None,
        }
    }

    pub fn theme(&self) -> &'static Theme {
        match self {
            ThemeKind::Europass => &EUROPASS,
            ThemeKind::Midnight => &MIDNIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub kind: ThemeKind,
    pub palette: Palette,
    pub typography: Typography,
    pub page: PageGeometry,
    pub document: DocumentGeometry,
    /// Number of dots in a proficiency indicator. Ranks are clamped to this.
    pub proficiency_scale: u8,
    /// Body font family of the flowing document.
    pub document_font: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in themes
// ────────────────────────────────────────────────────────────────────────────

static EUROPASS: Lazy<Theme> = Lazy::new(|| {
    build_theme(
        ThemeKind::Europass,
        Palette {
            sidebar_background: Rgb::hex(0x003399),
            main_background: Rgb::WHITE,
            accent: Rgb::hex(0xFFCC00),
            sidebar_text: Rgb::WHITE,
            badge: Rgb::hex(0x0050A0),
            heading: Rgb::hex(0x0050A0),
            name: Rgb::hex(0x003399),
            body: Rgb::hex(0x333333),
            muted: Rgb::hex(0x666666),
        },
    )
});

static MIDNIGHT: Lazy<Theme> = Lazy::new(|| {
    build_theme(
        ThemeKind::Midnight,
        Palette {
            sidebar_background: Rgb::hex(0x1F2933),
            main_background: Rgb::hex(0xFCFCFA),
            accent: Rgb::hex(0xF5B700),
            sidebar_text: Rgb::hex(0xF0F4F8),
            badge: Rgb::hex(0x3E4C59),
            heading: Rgb::hex(0x323F4B),
            name: Rgb::hex(0x1F2933),
            body: Rgb::hex(0x2D2D2D),
            muted: Rgb::hex(0x6B7280),
        },
    )
});

fn build_theme(kind: ThemeKind, palette: Palette) -> Theme {
    use FontFace::{Bold, Oblique, Regular};

    let typography = Typography {
        sidebar_header: HeaderStyle {
            text: TextStyle::new(Bold, 9.0, palette.accent, 11.0),
            rule_color: palette.accent,
            rule_width: 0.5,
            space_before: 14.0,
            space_after: 4.0,
        },
        sidebar_label: TextStyle::new(Bold, 7.0, palette.accent, 9.0),
        sidebar_value: TextStyle::new(Regular, 8.0, palette.sidebar_text, 10.0),
        language_name: TextStyle::new(Bold, 8.0, palette.sidebar_text, 10.0),
        language_level: TextStyle::new(Regular, 7.0, palette.accent, 10.0),
        initials: TextStyle::new(Bold, 28.0, palette.accent, 28.0),
        main_header: HeaderStyle {
            text: TextStyle::new(Bold, 11.0, palette.heading, 14.0),
            rule_color: palette.heading,
            rule_width: 1.0,
            space_before: 14.0,
            space_after: 4.0,
        },
        name: TextStyle::new(Bold, 22.0, palette.name, 26.0),
        objective: TextStyle::new(Regular, 9.0, palette.body, 13.0),
        entry_title: TextStyle::new(Bold, 9.0, palette.body, 12.0),
        entry_meta: TextStyle::new(Oblique, 8.0, palette.muted, 10.0),
        body: TextStyle::new(Regular, 9.0, palette.body, 12.0),
    };

    let page = PageGeometry {
        page_width: 210.0 * MM,
        page_height: 297.0 * MM,
        sidebar_width: 68.0 * MM,
        sidebar_pad_left: 8.0 * MM,
        sidebar_pad_right: 4.0 * MM,
        main_pad: 8.0 * MM,
        top_margin: 8.0 * MM,
        bottom_margin: 8.0 * MM,
        portrait_diameter: 44.0 * MM,
        portrait_ring: 2.0,
        dot_radius: 2.2,
        dot_gap: 2.4,
    };

    let page_width = (21.0 * TWIPS_PER_CM).round() as u32;
    let sidebar_width = (6.8 * TWIPS_PER_CM).round() as u32;
    let document = DocumentGeometry {
        page_width,
        page_height: (29.7 * TWIPS_PER_CM).round() as u32,
        sidebar_width,
        main_width: page_width - sidebar_width,
        indent: (0.5 * TWIPS_PER_CM).round() as u32,
        portrait_mm: 36,
    };

    Theme {
        kind,
        palette,
        typography,
        page,
        document,
        proficiency_scale: 5,
        document_font: "Calibri",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_columns_sum_to_page_width() {
        let page = ThemeKind::Europass.theme().page;
        let total = page.sidebar_width + page.main_width();
        assert!((total - page.page_width).abs() < 1e-3);
        assert!((page.page_width - 595.28).abs() < 0.1, "A4 width in points");
        assert!((page.page_height - 841.89).abs() < 0.1, "A4 height in points");
    }

    #[test]
    fn test_document_columns_sum_to_page_width() {
        let doc = ThemeKind::Midnight.theme().document;
        assert_eq!(doc.sidebar_width + doc.main_width, doc.page_width);
        assert_eq!(doc.page_width, 11906);
        assert_eq!(doc.page_height, 16838);
    }

    #[test]
    fn test_sidebar_text_is_light_and_main_text_is_dark() {
        for kind in [ThemeKind::Europass, ThemeKind::Midnight] {
            let theme = kind.theme();
            let luma = |c: Rgb| 0.299 * c.0 as f32 + 0.587 * c.1 as f32 + 0.114 * c.2 as f32;
            assert!(luma(theme.typography.sidebar_value.color) > luma(theme.palette.sidebar_background));
            assert!(luma(theme.typography.body.color) < luma(theme.palette.main_background));
        }
    }

    #[test]
    fn test_rgb_hex_round_trip() {
        let gold = Rgb::hex(0xFFCC00);
        assert_eq!(gold, Rgb(255, 204, 0));
        assert_eq!(gold.to_hex(), "FFCC00");
        assert_eq!(Rgb::WHITE.unit(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_theme_kind_parse() {
        assert_eq!(ThemeKind::parse(" Midnight "), Some(ThemeKind::Midnight));
        assert_eq!(ThemeKind::parse("europass"), Some(ThemeKind::Europass));
        assert_eq!(ThemeKind::parse("neon"), None);
    }
}
