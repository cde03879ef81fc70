//! Vector page surface: block lists → draw ops → a single-page PDF.
//!
//! Blocks are flowed through one [`ColumnFlow`] per panel. The resulting draw
//! list is in top-down coordinates; [`encode`] flips Y while writing the content
//! stream. Fonts are the standard-14 Helvetica family with WinAnsi encoding, so
//! nothing needs embedding.

use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use tracing::{debug, warn};

use crate::layout::draw::{DrawList, DrawOp, Stroke};
use crate::layout::font_metrics::{FontFace, TextMeasure};
use crate::layout::section_flow::{Column, ColumnFlow, DotStyle, Fit};
use crate::layout::theme::{Rgb, Theme, MM};
use crate::profile::models::OutputFormat;
use crate::profile::proficiency::DotIndicator;
use crate::render::blocks::{Block, DocumentPlan};
use crate::render::compose::{DocumentWriter, RenderError};
use crate::render::portrait::Portrait;

/// Bézier control-point factor for a quarter circle.
const KAPPA: f32 = 0.552_284_8;
/// Main column starts a little below the sidebar so the name clears the portrait's top.
const MAIN_TOP_OFFSET: f32 = 4.0 * MM;

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PageLayout {
    pub ops: DrawList,
    pub sidebar_overflow: bool,
    pub main_overflow: bool,
}

/// Positions every block of both panels on one A4 page.
pub fn layout_page(plan: &DocumentPlan, theme: &Theme) -> PageLayout {
    let page = &theme.page;
    let palette = &theme.palette;
    let typography = &theme.typography;

    let mut ops = DrawList::new();
    ops.push(DrawOp::FillRect {
        x: 0.0,
        y: 0.0,
        width: page.sidebar_width,
        height: page.page_height,
        color: palette.sidebar_background,
    });
    ops.push(DrawOp::FillRect {
        x: page.sidebar_width,
        y: 0.0,
        width: page.main_width(),
        height: page.page_height,
        color: palette.main_background,
    });

    let mut sidebar = ColumnFlow::new(
        Column {
            x: page.sidebar_pad_left,
            width: page.sidebar_text_width(),
            bottom_limit: page.content_bottom(),
        },
        typography.sidebar_header,
        page.top_margin,
    );
    flow_blocks(&mut sidebar, plan.sidebar.blocks(), plan, theme);

    let mut main = ColumnFlow::new(
        Column {
            x: page.sidebar_width + page.main_pad,
            width: page.main_text_width(),
            bottom_limit: page.content_bottom(),
        },
        typography.main_header,
        page.top_margin + MAIN_TOP_OFFSET,
    );
    flow_blocks(&mut main, plan.main.blocks(), plan, theme);

    debug!(
        sidebar_cursor = sidebar.cursor(),
        main_cursor = main.cursor(),
        "page laid out"
    );

    let sidebar_overflow = sidebar.overflowed();
    let main_overflow = main.overflowed();
    ops.append(sidebar.into_ops());
    ops.append(main.into_ops());

    PageLayout {
        ops,
        sidebar_overflow,
        main_overflow,
    }
}

/// Single-word values (URLs, emails) are truncated; anything with spaces wraps.
fn fit_for(value: &str) -> Fit {
    if value.split_whitespace().nth(1).is_some() {
        Fit::Wrap
    } else {
        Fit::Truncate
    }
}

fn flow_blocks(flow: &mut ColumnFlow, blocks: &[Block], plan: &DocumentPlan, theme: &Theme) {
    let t = &theme.typography;
    let page = &theme.page;

    for block in blocks {
        match block {
            Block::Portrait => place_portrait(flow, &plan.portrait, theme),
            Block::SectionHeader(kind) => {
                flow.emit_section_header(kind.title());
            }
            Block::ContactLine { prefix, value } => {
                let line = match prefix {
                    Some(p) => format!("{p}  {value}"),
                    None => value.clone(),
                };
                flow.emit_text(&line, t.sidebar_value, fit_for(value));
                flow.space(2.0);
            }
            Block::LabelValue { label, value } => {
                flow.emit_text(label, t.sidebar_label, Fit::Truncate);
                flow.emit_text(value, t.sidebar_value, fit_for(value));
                flow.space(3.0);
            }
            Block::Language { name, level, rank } => {
                flow.emit_text(name, t.language_name, Fit::Truncate);
                flow.emit_proficiency(
                    level,
                    t.language_level,
                    DotIndicator::new(*rank, theme.proficiency_scale),
                    DotStyle {
                        radius: page.dot_radius,
                        gap: page.dot_gap,
                        color: theme.palette.accent,
                    },
                );
                flow.space(2.0);
            }
            Block::SkillGroup { category, skills } => {
                flow.emit_text(category, t.sidebar_label, Fit::Truncate);
                flow.emit_text(skills, t.sidebar_value, Fit::Wrap);
                flow.space(3.0);
            }
            Block::Name(text) => {
                flow.emit_text(text, t.name, Fit::Truncate);
                flow.space(2.0);
            }
            Block::Paragraph(text) => {
                flow.emit_text(text, t.objective, Fit::Wrap);
                flow.space(4.0);
            }
            Block::Entry {
                title,
                right,
                subtitle,
                detail,
            } => {
                flow.emit_entry(
                    title,
                    t.entry_title,
                    right.as_deref().map(|r| (r, t.entry_meta)),
                    subtitle.as_deref().map(|s| (s, t.entry_meta)),
                );
                if let Some(detail) = detail {
                    flow.emit_text(detail, t.body, Fit::Wrap);
                }
                flow.space(4.0);
            }
            Block::Bullets(items) => {
                flow.emit_bullets(items, t.body);
                flow.space(4.0);
            }
        }
    }
}

/// Centers the portrait horizontally in the sidebar at the current cursor.
fn place_portrait(flow: &mut ColumnFlow, portrait: &Portrait, theme: &Theme) {
    let page = &theme.page;
    let palette = &theme.palette;
    let diameter = page.portrait_diameter;
    let cx = page.sidebar_width / 2.0;
    let cy = flow.cursor() + diameter / 2.0;
    let ring = Stroke {
        color: palette.accent,
        width: page.portrait_ring,
    };

    match portrait {
        Portrait::Photo(image) => flow.draw(DrawOp::ClippedImage {
            cx,
            cy,
            diameter,
            jpeg: image.jpeg.clone(),
            pixels: image.pixels,
            ring,
        }),
        Portrait::Initials(initials) => {
            flow.draw(DrawOp::Circle {
                cx,
                cy,
                radius: diameter / 2.0,
                fill: Some(palette.badge),
                stroke: Some(ring),
            });
            if !initials.is_empty() {
                let style = theme.typography.initials;
                let width = style.measure().width(initials);
                flow.draw(DrawOp::Text {
                    x: cx - width / 2.0,
                    baseline: cy + style.size * 0.35,
                    text: initials.clone(),
                    style,
                });
            }
        }
    }
    flow.space(diameter + 4.0 * MM);
}

// ────────────────────────────────────────────────────────────────────────────
// Encoding
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfWriter;

impl DocumentWriter for PdfWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn write(&self, plan: &DocumentPlan, theme: &Theme) -> Result<Vec<u8>, RenderError> {
        let layout = layout_page(plan, theme);
        if layout.sidebar_overflow || layout.main_overflow {
            warn!(
                sidebar = layout.sidebar_overflow,
                main = layout.main_overflow,
                "content runs past the bottom margin of the single page"
            );
        }
        encode(&layout.ops, theme, &plan.display_name)
    }
}

/// Writes the draw list as a one-page PDF with uncompressed content.
pub fn encode(ops: &DrawList, theme: &Theme, title: &str) -> Result<Vec<u8>, RenderError> {
    let page_width = theme.page.page_width;
    let page_height = theme.page.page_height;

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }

    let mut xobjects = Dictionary::new();
    let mut painter = Painter {
        operations: Vec::new(),
        page_height,
    };

    for op in ops.iter() {
        match op {
            DrawOp::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                painter.fill_color(*color);
                painter.push(
                    "re",
                    vec![
                        (*x).into(),
                        painter.flip(y + height).into(),
                        (*width).into(),
                        (*height).into(),
                    ],
                );
                painter.push("f", vec![]);
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                stroke,
            } => {
                painter.stroke(*stroke);
                painter.push("m", vec![(*x1).into(), painter.flip(*y1).into()]);
                painter.push("l", vec![(*x2).into(), painter.flip(*y2).into()]);
                painter.push("S", vec![]);
            }
            DrawOp::Text {
                x,
                baseline,
                text,
                style,
            } => {
                painter.push("BT", vec![]);
                painter.push(
                    "Tf",
                    vec![style.face.resource_name().into(), style.size.into()],
                );
                painter.fill_color(style.color);
                painter.push("Td", vec![(*x).into(), painter.flip(*baseline).into()]);
                painter.push(
                    "Tj",
                    vec![Object::String(to_win_ansi(text), StringFormat::Literal)],
                );
                painter.push("ET", vec![]);
            }
            DrawOp::Circle {
                cx,
                cy,
                radius,
                fill,
                stroke,
            } => {
                if let Some(color) = fill {
                    painter.fill_color(*color);
                }
                if let Some(s) = stroke {
                    painter.stroke(*s);
                }
                painter.circle(*cx, *cy, *radius);
                let paint = match (fill, stroke) {
                    (Some(_), Some(_)) => "B",
                    (Some(_), None) => "f",
                    (None, Some(_)) => "S",
                    (None, None) => "n",
                };
                painter.push(paint, vec![]);
            }
            DrawOp::ClippedImage {
                cx,
                cy,
                diameter,
                jpeg,
                pixels,
                ring,
            } => {
                let name = format!("Im{}", xobjects.len() + 1);
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => *pixels as i64,
                        "Height" => *pixels as i64,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                        "Filter" => "DCTDecode",
                    },
                    jpeg.to_vec(),
                ));
                xobjects.set(name.as_bytes().to_vec(), image_id);

                let radius = diameter / 2.0;
                painter.push("q", vec![]);
                painter.circle(*cx, *cy, radius);
                painter.push("W", vec![]);
                painter.push("n", vec![]);
                painter.push(
                    "cm",
                    vec![
                        (*diameter).into(),
                        0.into(),
                        0.into(),
                        (*diameter).into(),
                        (cx - radius).into(),
                        painter.flip(cy + radius).into(),
                    ],
                );
                painter.push("Do", vec![Object::Name(name.into_bytes())]);
                painter.push("Q", vec![]);

                painter.stroke(*ring);
                painter.circle(*cx, *cy, radius);
                painter.push("S", vec![]);
            }
        }
    }

    let content = Content {
        operations: painter.operations,
    };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

    let mut resources = dictionary! { "Font" => fonts };
    if !xobjects.is_empty() {
        resources.set("XObject", xobjects);
    }

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
        "Contents" => content_id,
        "Resources" => resources,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(to_win_ansi(title), StringFormat::Literal),
        "Producer" => Object::string_literal("cv-api"),
        "CreationDate" => Object::string_literal(Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

struct Painter {
    operations: Vec<Operation>,
    page_height: f32,
}

impl Painter {
    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn flip(&self, y: f32) -> f32 {
        self.page_height - y
    }

    fn fill_color(&mut self, color: Rgb) {
        let [r, g, b] = color.unit();
        self.push("rg", vec![r.into(), g.into(), b.into()]);
    }

    fn stroke(&mut self, stroke: Stroke) {
        let [r, g, b] = stroke.color.unit();
        self.push("RG", vec![r.into(), g.into(), b.into()]);
        self.push("w", vec![stroke.width.into()]);
    }

    /// Appends a closed circular path built from four cubic arcs.
    fn circle(&mut self, cx: f32, cy: f32, r: f32) {
        let cy = self.flip(cy);
        let k = KAPPA * r;
        self.push("m", vec![(cx + r).into(), cy.into()]);
        for [x1, y1, x2, y2, x3, y3] in [
            [cx + r, cy + k, cx + k, cy + r, cx, cy + r],
            [cx - k, cy + r, cx - r, cy + k, cx - r, cy],
            [cx - r, cy - k, cx - k, cy - r, cx, cy - r],
            [cx + k, cy - r, cx + r, cy - k, cx + r, cy],
        ] {
            self.push(
                "c",
                vec![x1.into(), y1.into(), x2.into(), y2.into(), x3.into(), y3.into()],
            );
        }
        self.push("h", vec![]);
    }
}

/// Transcodes to WinAnsi (Windows-1252). Unmappable characters become `?`.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => match c {
                '€' => 0x80,
                '‚' => 0x82,
                'ƒ' => 0x83,
                '„' => 0x84,
                '…' => 0x85,
                '†' => 0x86,
                '‡' => 0x87,
                'ˆ' => 0x88,
                '‰' => 0x89,
                'Š' => 0x8A,
                '‹' => 0x8B,
                'Œ' => 0x8C,
                'Ž' => 0x8E,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '˜' => 0x98,
                '™' => 0x99,
                'š' => 0x9A,
                '›' => 0x9B,
                'œ' => 0x9C,
                'ž' => 0x9E,
                'Ÿ' => 0x9F,
                _ => b'?',
            },
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::theme::ThemeKind;
    use crate::profile::models::{EducationEntry, LanguageEntry, ProfileRecord, SkillGroup};
    use crate::render::blocks::plan_document;

    fn theme() -> &'static Theme {
        ThemeKind::Europass.theme()
    }

    fn ali() -> ProfileRecord {
        ProfileRecord {
            first_name: "Ali".into(),
            last_name: "Vali".into(),
            education: vec![EducationEntry {
                degree: "Bachelor".into(),
                institution: "TUIT".into(),
                years: "2018-2022".into(),
                gpa: Some("3.8".into()),
            }],
            skills: vec![SkillGroup {
                category: "Programming".into(),
                skills: "Python, Go".into(),
            }],
            languages: vec![LanguageEntry {
                language: "English".into(),
                level: "C1".into(),
            }],
            ..Default::default()
        }
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn test_layout_contains_expected_text() {
        let layout = layout_page(&plan_document(&ali(), theme()), theme());
        let texts: Vec<_> = layout.ops.texts().collect();
        for expected in ["ALI VALI", "TUIT", "2018-2022", "Programming", "English", "AV"] {
            assert!(texts.contains(&expected), "missing {expected:?} in {texts:?}");
        }
        assert!(!layout.sidebar_overflow && !layout.main_overflow);
    }

    #[test]
    fn test_c1_language_draws_five_filled_dots() {
        let layout = layout_page(&plan_document(&ali(), theme()), theme());
        let accent = theme().palette.accent;
        let radius = theme().page.dot_radius;
        let dots: Vec<_> = layout
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Circle { radius: r, fill, .. } if *r == radius => Some(*fill),
                _ => None,
            })
            .collect();
        assert_eq!(dots.len(), 5);
        assert!(dots.iter().all(|f| *f == Some(accent)));
    }

    #[test]
    fn test_empty_education_draws_no_header() {
        let mut profile = ali();
        profile.education.clear();
        let layout = layout_page(&plan_document(&profile, theme()), theme());
        assert!(!layout.ops.texts().any(|t| t == "EDUCATION"));
    }

    #[test]
    fn test_main_text_stays_in_main_column() {
        let layout = layout_page(&plan_document(&ali(), theme()), theme());
        let sidebar_width = theme().page.sidebar_width;
        for op in layout.ops.iter() {
            if let DrawOp::Text { x, text, .. } = op {
                if text == "TUIT" || text == "ALI VALI" {
                    assert!(*x > sidebar_width, "{text} drawn at {x}");
                }
                if text == "English" {
                    assert!(*x < sidebar_width, "{text} drawn at {x}");
                }
            }
        }
    }

    #[test]
    fn test_long_profile_sets_overflow_flag() {
        let mut profile = ali();
        profile.hobbies = Some("chess ".repeat(2000));
        let layout = layout_page(&plan_document(&profile, theme()), theme());
        assert!(layout.main_overflow);
        assert!(!layout.sidebar_overflow);
    }

    #[test]
    fn test_written_pdf_loads_with_one_page() {
        let bytes = PdfWriter.write(&plan_document(&ali(), theme()), theme()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(contains(&bytes, "(ALI VALI)"));
        assert!(contains(&bytes, "/Helvetica-Bold"));
    }

    #[test]
    fn test_win_ansi_maps_known_and_replaces_unknown() {
        assert_eq!(to_win_ansi("Ali"), b"Ali".to_vec());
        assert_eq!(to_win_ansi("é–•"), vec![0xE9, 0x96, 0x95]);
        assert_eq!(to_win_ansi("Ж"), b"?".to_vec());
    }
}
