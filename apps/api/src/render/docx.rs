//! Flowing document surface: block lists → a WordprocessingML package.
//!
//! The page is a single 1×2 table. The sidebar cell is shaded with the theme's
//! sidebar background; the main cell stays light. Margins are zero so the table
//! spans the whole A4 sheet. Every part is streamed through a `quick_xml::Writer`
//! and zipped.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::layout::font_metrics::FontFace;
use crate::layout::theme::{Rgb, TextStyle, Theme, EMU_PER_MM};
use crate::profile::models::OutputFormat;
use crate::profile::proficiency::DotIndicator;
use crate::render::blocks::{Block, DocumentPlan, PanelContent};
use crate::render::compose::{DocumentWriter, RenderError};
use crate::render::portrait::Portrait;

const PORTRAIT_REL_ID: &str = "rIdPortrait";
const PORTRAIT_PART: &str = "word/media/portrait.png";
const SIDEBAR_HEADER_MARK: &str = "◆";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_PICTURE: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const DOCUMENT_NAMESPACES: &[(&str, &str)] = &[
    ("xmlns:w", NS_MAIN),
    ("xmlns:r", REL_TYPE_BASE),
    (
        "xmlns:wp",
        "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing",
    ),
    ("xmlns:a", "http://schemas.openxmlformats.org/drawingml/2006/main"),
    ("xmlns:pic", NS_PICTURE),
];

// ────────────────────────────────────────────────────────────────────────────
// XML helpers
// ────────────────────────────────────────────────────────────────────────────

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// A fresh part, already carrying the XML declaration.
fn part_writer() -> Result<XmlWriter, RenderError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut elem = BytesStart::new(name);
    for &attr in attrs {
        elem.push_attribute(attr);
    }
    elem
}

fn open(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
    w.write_event(Event::Start(element(name, attrs)))?;
    Ok(())
}

fn empty(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
    w.write_event(Event::Empty(element(name, attrs)))?;
    Ok(())
}

fn close(w: &mut XmlWriter, name: &str) -> Result<(), RenderError> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Writes user text. `BytesText::new` escapes markup; `xml_safe` drops what XML
/// cannot carry at all.
fn text(w: &mut XmlWriter, value: &str) -> Result<(), RenderError> {
    w.write_event(Event::Text(BytesText::new(&xml_safe(value))))?;
    Ok(())
}

/// XML 1.0 `Char`: tab, LF, CR, and everything from U+0020 up except U+FFFE/U+FFFF.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
}

/// Removes characters XML 1.0 forbids anywhere in a document.
fn xml_safe(value: &str) -> Cow<'_, str> {
    if value.chars().all(is_xml_char) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Paragraph builder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum RunContent {
    Text(String),
    Tab,
    /// Inline portrait, square side in EMU.
    Drawing(i64),
}

#[derive(Debug, Clone)]
struct Run {
    content: RunContent,
    style: Option<TextStyle>,
}

impl Run {
    fn text(text: &str, style: TextStyle) -> Self {
        Run {
            content: RunContent::Text(text.to_string()),
            style: Some(style),
        }
    }

    fn tab() -> Self {
        Run {
            content: RunContent::Tab,
            style: None,
        }
    }

    fn write(&self, w: &mut XmlWriter) -> Result<(), RenderError> {
        open(w, "w:r", &[])?;
        if let Some(style) = self.style {
            write_run_properties(w, style)?;
        }
        match &self.content {
            RunContent::Text(value) => {
                open(w, "w:t", &[("xml:space", "preserve")])?;
                text(w, value)?;
                close(w, "w:t")?;
            }
            RunContent::Tab => empty(w, "w:tab", &[])?,
            RunContent::Drawing(emu) => write_inline_picture(w, *emu)?,
        }
        close(w, "w:r")
    }
}

fn write_run_properties(w: &mut XmlWriter, style: TextStyle) -> Result<(), RenderError> {
    let half_points = ((style.size * 2.0).round() as u32).to_string();
    open(w, "w:rPr", &[])?;
    match style.face {
        FontFace::Bold => empty(w, "w:b", &[])?,
        FontFace::Oblique => empty(w, "w:i", &[])?,
        FontFace::Regular => {}
    }
    empty(w, "w:color", &[("w:val", style.color.to_hex().as_str())])?;
    empty(w, "w:sz", &[("w:val", half_points.as_str())])?;
    empty(w, "w:szCs", &[("w:val", half_points.as_str())])?;
    close(w, "w:rPr")
}

#[derive(Debug, Clone, Default)]
struct Para {
    runs: Vec<Run>,
    centered: bool,
    before: u32,
    after: u32,
    right_tab: Option<u32>,
    bottom_border: Option<Rgb>,
    hanging: Option<(u32, u32)>,
}

impl Para {
    fn new() -> Self {
        Self::default()
    }

    fn run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    fn spacing(mut self, before: u32, after: u32) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    fn centered(mut self) -> Self {
        self.centered = true;
        self
    }

    fn right_tab(mut self, position: u32) -> Self {
        self.right_tab = Some(position);
        self
    }

    fn bottom_border(mut self, color: Rgb) -> Self {
        self.bottom_border = Some(color);
        self
    }

    fn hanging(mut self, left: u32, hanging: u32) -> Self {
        self.hanging = Some((left, hanging));
        self
    }

    /// Paragraph properties follow the schema order: pBdr, tabs, spacing, ind, jc.
    fn write(&self, w: &mut XmlWriter) -> Result<(), RenderError> {
        open(w, "w:p", &[])?;
        open(w, "w:pPr", &[])?;
        if let Some(color) = self.bottom_border {
            open(w, "w:pBdr", &[])?;
            empty(
                w,
                "w:bottom",
                &[
                    ("w:val", "single"),
                    ("w:sz", "8"),
                    ("w:space", "1"),
                    ("w:color", color.to_hex().as_str()),
                ],
            )?;
            close(w, "w:pBdr")?;
        }
        if let Some(pos) = self.right_tab {
            open(w, "w:tabs", &[])?;
            empty(w, "w:tab", &[("w:val", "right"), ("w:pos", pos.to_string().as_str())])?;
            close(w, "w:tabs")?;
        }
        empty(
            w,
            "w:spacing",
            &[
                ("w:before", self.before.to_string().as_str()),
                ("w:after", self.after.to_string().as_str()),
            ],
        )?;
        if let Some((left, hanging)) = self.hanging {
            empty(
                w,
                "w:ind",
                &[
                    ("w:left", left.to_string().as_str()),
                    ("w:hanging", hanging.to_string().as_str()),
                ],
            )?;
        }
        if self.centered {
            empty(w, "w:jc", &[("w:val", "center")])?;
        }
        close(w, "w:pPr")?;

        for run in &self.runs {
            run.write(w)?;
        }
        close(w, "w:p")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Block mapping
// ────────────────────────────────────────────────────────────────────────────

/// Which table cell a block list is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Sidebar,
    Main,
}

fn cell_paragraphs(panel: &PanelContent, cell: Cell, plan: &DocumentPlan, theme: &Theme) -> Vec<Para> {
    let t = &theme.typography;
    let accent = theme.palette.accent;
    let doc = &theme.document;
    let cell_width = match cell {
        Cell::Sidebar => doc.sidebar_width,
        Cell::Main => doc.main_width,
    };
    let content_width = cell_width.saturating_sub(2 * doc.indent);

    let mut paras = Vec::new();
    for block in panel.blocks() {
        match block {
            Block::Portrait => {
                if let Some(p) = portrait_paragraph(&plan.portrait, theme) {
                    paras.push(p);
                }
            }
            Block::SectionHeader(kind) => {
                let para = match cell {
                    Cell::Sidebar => Para::new().spacing(240, 80).run(Run::text(
                        &format!("{SIDEBAR_HEADER_MARK} {}", kind.title()),
                        t.sidebar_header.text,
                    )),
                    Cell::Main => Para::new()
                        .spacing(240, 100)
                        .bottom_border(t.main_header.rule_color)
                        .run(Run::text(kind.title(), t.main_header.text)),
                };
                paras.push(para);
            }
            Block::ContactLine { prefix, value } => {
                let mut para = Para::new().spacing(0, 60);
                if let Some(prefix) = prefix {
                    para = para.run(Run::text(&format!("{prefix}  "), t.sidebar_label));
                }
                paras.push(para.run(Run::text(value, t.sidebar_value)));
            }
            Block::LabelValue { label, value } => {
                paras.push(Para::new().run(Run::text(label, t.sidebar_label)));
                paras.push(Para::new().spacing(0, 80).run(Run::text(value, t.sidebar_value)));
            }
            Block::Language { name, level, rank } => {
                let dots = DotIndicator::new(*rank, theme.proficiency_scale);
                paras.push(Para::new().run(Run::text(name, t.language_name)));
                paras.push(
                    Para::new()
                        .spacing(0, 80)
                        .run(Run::text(&format!("{level}  "), t.language_level))
                        .run(Run::text(&dots.glyphs(), t.language_level.with_color(accent))),
                );
            }
            Block::SkillGroup { category, skills } => {
                paras.push(Para::new().run(Run::text(category, t.sidebar_label)));
                paras.push(Para::new().spacing(0, 80).run(Run::text(skills, t.sidebar_value)));
            }
            Block::Name(text) => {
                paras.push(Para::new().spacing(0, 80).run(Run::text(text, t.name)));
            }
            Block::Paragraph(text) => {
                paras.push(Para::new().spacing(0, 80).run(Run::text(text, t.objective)));
            }
            Block::Entry {
                title,
                right,
                subtitle,
                detail,
            } => {
                let mut head = Para::new()
                    .spacing(80, 0)
                    .right_tab(content_width)
                    .run(Run::text(title, t.entry_title));
                if let Some(right) = right.as_deref().filter(|r| !r.is_empty()) {
                    head = head.run(Run::tab()).run(Run::text(right, t.entry_meta));
                }
                paras.push(head);
                if let Some(subtitle) = subtitle {
                    paras.push(Para::new().run(Run::text(subtitle, t.entry_meta)));
                }
                if let Some(detail) = detail {
                    paras.push(Para::new().run(Run::text(detail, t.body)));
                }
            }
            Block::Bullets(items) => {
                for item in items {
                    paras.push(
                        Para::new()
                            .hanging(284, 142)
                            .run(Run::text(&format!("•\u{a0}{item}"), t.body)),
                    );
                }
            }
        }
    }
    paras
}

fn portrait_paragraph(portrait: &Portrait, theme: &Theme) -> Option<Para> {
    match portrait {
        Portrait::Photo(_) => {
            let emu = theme.document.portrait_mm * EMU_PER_MM;
            Some(Para::new().centered().spacing(120, 120).run(Run {
                content: RunContent::Drawing(emu),
                style: None,
            }))
        }
        Portrait::Initials(initials) if !initials.is_empty() => Some(
            Para::new()
                .centered()
                .spacing(240, 240)
                .run(Run::text(initials, theme.typography.initials)),
        ),
        Portrait::Initials(_) => None,
    }
}

/// DrawingML inline picture clipped to an ellipse, pointing at the portrait part.
fn write_inline_picture(w: &mut XmlWriter, emu: i64) -> Result<(), RenderError> {
    let size = emu.to_string();
    let size = size.as_str();

    open(w, "w:drawing", &[])?;
    open(
        w,
        "wp:inline",
        &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
    )?;
    empty(w, "wp:extent", &[("cx", size), ("cy", size)])?;
    empty(w, "wp:docPr", &[("id", "1"), ("name", "Portrait")])?;
    open(w, "a:graphic", &[])?;
    open(w, "a:graphicData", &[("uri", NS_PICTURE)])?;
    open(w, "pic:pic", &[])?;

    open(w, "pic:nvPicPr", &[])?;
    empty(w, "pic:cNvPr", &[("id", "0"), ("name", "portrait.png")])?;
    empty(w, "pic:cNvPicPr", &[])?;
    close(w, "pic:nvPicPr")?;

    open(w, "pic:blipFill", &[])?;
    empty(w, "a:blip", &[("r:embed", PORTRAIT_REL_ID)])?;
    open(w, "a:stretch", &[])?;
    empty(w, "a:fillRect", &[])?;
    close(w, "a:stretch")?;
    close(w, "pic:blipFill")?;

    open(w, "pic:spPr", &[])?;
    open(w, "a:xfrm", &[])?;
    empty(w, "a:off", &[("x", "0"), ("y", "0")])?;
    empty(w, "a:ext", &[("cx", size), ("cy", size)])?;
    close(w, "a:xfrm")?;
    open(w, "a:prstGeom", &[("prst", "ellipse")])?;
    empty(w, "a:avLst", &[])?;
    close(w, "a:prstGeom")?;
    close(w, "pic:spPr")?;

    close(w, "pic:pic")?;
    close(w, "a:graphicData")?;
    close(w, "a:graphic")?;
    close(w, "wp:inline")?;
    close(w, "w:drawing")
}

// ────────────────────────────────────────────────────────────────────────────
// Package parts
// ────────────────────────────────────────────────────────────────────────────

fn write_cell(
    w: &mut XmlWriter,
    width: u32,
    fill: Rgb,
    pad: u32,
    paras: &[Para],
) -> Result<(), RenderError> {
    let width = width.to_string();
    let pad = pad.to_string();

    open(w, "w:tc", &[])?;
    open(w, "w:tcPr", &[])?;
    empty(w, "w:tcW", &[("w:w", width.as_str()), ("w:type", "dxa")])?;
    empty(
        w,
        "w:shd",
        &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill.to_hex().as_str())],
    )?;
    open(w, "w:tcMar", &[])?;
    for side in ["w:top", "w:left", "w:right"] {
        empty(w, side, &[("w:w", pad.as_str()), ("w:type", "dxa")])?;
    }
    close(w, "w:tcMar")?;
    close(w, "w:tcPr")?;

    // A cell must hold at least one paragraph.
    if paras.is_empty() {
        Para::new().write(w)?;
    }
    for para in paras {
        para.write(w)?;
    }
    close(w, "w:tc")
}

fn document_xml(plan: &DocumentPlan, theme: &Theme) -> Result<Vec<u8>, RenderError> {
    let doc = &theme.document;
    let palette = &theme.palette;
    let page_w = doc.page_width.to_string();
    let page_h = doc.page_height.to_string();
    // Leaves room for the trailing paragraph so the table never spills onto a second page.
    let row_h = doc.page_height.saturating_sub(120).to_string();

    let mut writer = part_writer()?;
    let w = &mut writer;
    open(w, "w:document", DOCUMENT_NAMESPACES)?;
    open(w, "w:body", &[])?;

    open(w, "w:tbl", &[])?;
    open(w, "w:tblPr", &[])?;
    empty(w, "w:tblW", &[("w:w", page_w.as_str()), ("w:type", "dxa")])?;
    empty(w, "w:tblLayout", &[("w:type", "fixed")])?;
    open(w, "w:tblBorders", &[])?;
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        empty(w, side, &[("w:val", "nil")])?;
    }
    close(w, "w:tblBorders")?;
    open(w, "w:tblCellMar", &[])?;
    empty(w, "w:left", &[("w:w", "0"), ("w:type", "dxa")])?;
    empty(w, "w:right", &[("w:w", "0"), ("w:type", "dxa")])?;
    close(w, "w:tblCellMar")?;
    close(w, "w:tblPr")?;

    open(w, "w:tblGrid", &[])?;
    empty(w, "w:gridCol", &[("w:w", doc.sidebar_width.to_string().as_str())])?;
    empty(w, "w:gridCol", &[("w:w", doc.main_width.to_string().as_str())])?;
    close(w, "w:tblGrid")?;

    open(w, "w:tr", &[])?;
    open(w, "w:trPr", &[])?;
    empty(w, "w:trHeight", &[("w:val", row_h.as_str()), ("w:hRule", "atLeast")])?;
    close(w, "w:trPr")?;
    write_cell(
        w,
        doc.sidebar_width,
        palette.sidebar_background,
        doc.indent,
        &cell_paragraphs(&plan.sidebar, Cell::Sidebar, plan, theme),
    )?;
    write_cell(
        w,
        doc.main_width,
        palette.main_background,
        doc.indent,
        &cell_paragraphs(&plan.main, Cell::Main, plan, theme),
    )?;
    close(w, "w:tr")?;
    close(w, "w:tbl")?;

    open(w, "w:p", &[])?;
    open(w, "w:pPr", &[])?;
    empty(
        w,
        "w:spacing",
        &[("w:before", "0"), ("w:after", "0"), ("w:line", "20"), ("w:lineRule", "exact")],
    )?;
    close(w, "w:pPr")?;
    close(w, "w:p")?;

    open(w, "w:sectPr", &[])?;
    empty(w, "w:pgSz", &[("w:w", page_w.as_str()), ("w:h", page_h.as_str())])?;
    empty(
        w,
        "w:pgMar",
        &[
            ("w:top", "0"),
            ("w:right", "0"),
            ("w:bottom", "0"),
            ("w:left", "0"),
            ("w:header", "0"),
            ("w:footer", "0"),
            ("w:gutter", "0"),
        ],
    )?;
    close(w, "w:sectPr")?;

    close(w, "w:body")?;
    close(w, "w:document")?;
    Ok(writer.into_inner().into_inner())
}

fn styles_xml(theme: &Theme) -> Result<Vec<u8>, RenderError> {
    let font = theme.document_font;
    let body = theme.typography.body;
    let half_points = ((body.size * 2.0).round() as u32).to_string();

    let mut writer = part_writer()?;
    let w = &mut writer;
    open(w, "w:styles", &[("xmlns:w", NS_MAIN)])?;

    open(w, "w:docDefaults", &[])?;
    open(w, "w:rPrDefault", &[])?;
    open(w, "w:rPr", &[])?;
    empty(
        w,
        "w:rFonts",
        &[("w:ascii", font), ("w:hAnsi", font), ("w:eastAsia", font), ("w:cs", font)],
    )?;
    empty(w, "w:color", &[("w:val", body.color.to_hex().as_str())])?;
    empty(w, "w:sz", &[("w:val", half_points.as_str())])?;
    empty(w, "w:szCs", &[("w:val", half_points.as_str())])?;
    empty(w, "w:lang", &[("w:val", "en-US")])?;
    close(w, "w:rPr")?;
    close(w, "w:rPrDefault")?;
    open(w, "w:pPrDefault", &[])?;
    open(w, "w:pPr", &[])?;
    empty(
        w,
        "w:spacing",
        &[("w:after", "0"), ("w:line", "240"), ("w:lineRule", "auto")],
    )?;
    close(w, "w:pPr")?;
    close(w, "w:pPrDefault")?;
    close(w, "w:docDefaults")?;

    for (kind, id, name, quick) in [
        ("paragraph", "Normal", "Normal", true),
        ("table", "TableNormal", "Normal Table", false),
    ] {
        open(
            w,
            "w:style",
            &[("w:type", kind), ("w:default", "1"), ("w:styleId", id)],
        )?;
        empty(w, "w:name", &[("w:val", name)])?;
        if quick {
            empty(w, "w:qFormat", &[])?;
        }
        close(w, "w:style")?;
    }

    close(w, "w:styles")?;
    Ok(writer.into_inner().into_inner())
}

fn content_types_xml() -> Result<Vec<u8>, RenderError> {
    let mut writer = part_writer()?;
    let w = &mut writer;
    open(
        w,
        "Types",
        &[("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")],
    )?;
    for (extension, content_type) in [
        ("rels", "application/vnd.openxmlformats-package.relationships+xml"),
        ("xml", "application/xml"),
        ("png", "image/png"),
    ] {
        empty(
            w,
            "Default",
            &[("Extension", extension), ("ContentType", content_type)],
        )?;
    }
    for (part, content_type) in [
        (
            "/word/document.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        ),
        (
            "/word/styles.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
        ),
    ] {
        empty(
            w,
            "Override",
            &[("PartName", part), ("ContentType", content_type)],
        )?;
    }
    close(w, "Types")?;
    Ok(writer.into_inner().into_inner())
}

/// A relationships part; each entry is `(id, type suffix, target)`.
fn relationships_xml(entries: &[(&str, &str, &str)]) -> Result<Vec<u8>, RenderError> {
    let mut writer = part_writer()?;
    let w = &mut writer;
    open(w, "Relationships", &[("xmlns", NS_RELATIONSHIPS)])?;
    for &(id, kind, target) in entries {
        let rel_type = format!("{REL_TYPE_BASE}/{kind}");
        empty(
            w,
            "Relationship",
            &[("Id", id), ("Type", rel_type.as_str()), ("Target", target)],
        )?;
    }
    close(w, "Relationships")?;
    Ok(writer.into_inner().into_inner())
}

fn package_rels_xml() -> Result<Vec<u8>, RenderError> {
    relationships_xml(&[("rId1", "officeDocument", "word/document.xml")])
}

fn document_rels_xml(with_portrait: bool) -> Result<Vec<u8>, RenderError> {
    let mut entries = vec![("rId1", "styles", "styles.xml")];
    if with_portrait {
        entries.push((PORTRAIT_REL_ID, "image", "media/portrait.png"));
    }
    relationships_xml(&entries)
}

// ────────────────────────────────────────────────────────────────────────────
// Writer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct DocxWriter;

impl DocumentWriter for DocxWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }

    fn write(&self, plan: &DocumentPlan, theme: &Theme) -> Result<Vec<u8>, RenderError> {
        let png = match &plan.portrait {
            Portrait::Photo(image) => Some(image.png_disc.clone()),
            Portrait::Initials(_) => None,
        };

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts = [
            ("[Content_Types].xml", content_types_xml()?),
            ("_rels/.rels", package_rels_xml()?),
            ("word/document.xml", document_xml(plan, theme)?),
            ("word/_rels/document.xml.rels", document_rels_xml(png.is_some())?),
            ("word/styles.xml", styles_xml(theme)?),
        ];
        for (name, xml) in parts {
            zip.start_file(name, options)?;
            zip.write_all(&xml)?;
        }
        if let Some(png) = png {
            zip.start_file(PORTRAIT_PART, options)?;
            zip.write_all(&png)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use image::{DynamicImage, ImageFormat, RgbImage};
    use quick_xml::Reader;
    use zip::ZipArchive;

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

    fn write(profile: &ProfileRecord) -> Vec<u8> {
        DocxWriter
            .write(&plan_document(profile, theme()), theme())
            .unwrap()
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    fn part_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_package_has_required_parts() {
        let names = part_names(&write(&ali()));
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
        ] {
            assert!(names.iter().any(|n| n == part), "missing {part}");
        }
        assert!(!names.iter().any(|n| n == PORTRAIT_PART));
    }

    #[test]
    fn test_document_contains_profile_text_and_dots() {
        let xml = read_part(&write(&ali()), "word/document.xml");
        for expected in ["ALI VALI", "TUIT", "2018-2022", "Programming", "English", "GPA: 3.8"] {
            assert!(xml.contains(expected), "missing {expected}");
        }
        assert!(xml.contains("●●●●●"), "C1 renders five filled dots");
        assert!(!xml.contains('○'));
        assert!(xml.contains("◆ LANGUAGES"));
        assert!(xml.contains(r#"w:fill="003399""#), "sidebar cell is shaded");
    }

    #[test]
    fn test_page_geometry_is_a4_without_margins() {
        let xml = read_part(&write(&ali()), "word/document.xml");
        assert!(xml.contains(r#"<w:pgSz w:w="11906" w:h="16838"/>"#));
        assert!(xml.contains(r#"w:top="0" w:right="0" w:bottom="0" w:left="0""#));
    }

    #[test]
    fn test_text_is_xml_escaped() {
        let mut profile = ali();
        profile.objective = Some("R&D <lead>".into());
        let xml = read_part(&write(&profile), "word/document.xml");
        assert!(xml.contains("R&amp;D &lt;lead&gt;"));
        assert!(!xml.contains("<lead>"));
    }

    #[test]
    fn test_missing_photo_renders_initials() {
        let xml = read_part(&write(&ali()), "word/document.xml");
        assert!(xml.contains(">AV</w:t>"));
        assert!(!xml.contains("<w:drawing>"));
    }

    #[test]
    fn test_photo_is_embedded_as_png_disc() {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 60, image::Rgb([200, 30, 30])))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let mut profile = ali();
        profile.photo = Some(png);

        let bytes = write(&profile);
        assert!(part_names(&bytes).iter().any(|n| n == PORTRAIT_PART));
        assert!(read_part(&bytes, "word/_rels/document.xml.rels").contains(PORTRAIT_REL_ID));
        let xml = read_part(&bytes, "word/document.xml");
        assert!(xml.contains(r#"prst="ellipse""#));
        assert!(!xml.contains(">AV</w:t>"));
    }

    #[test]
    fn test_empty_education_has_no_header() {
        let mut profile = ali();
        profile.education.clear();
        let xml = read_part(&write(&profile), "word/document.xml");
        assert!(!xml.contains("EDUCATION"));
    }

    #[test]
    fn test_every_part_is_well_formed() {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([0, 0, 0])))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let mut profile = ali();
        profile.photo = Some(png);
        let bytes = write(&profile);

        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
        ] {
            let xml = read_part(&bytes, part);
            assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
            let mut reader = Reader::from_str(&xml);
            loop {
                match reader.read_event() {
                    Ok(quick_xml::events::Event::Eof) => break,
                    Ok(_) => {}
                    Err(e) => panic!("{part} is malformed: {e}"),
                }
            }
        }
    }

    #[test]
    fn test_control_characters_are_dropped_from_text() {
        let mut profile = ali();
        profile.objective = Some("Team\u{1}player\u{b}".into());
        profile.hobbies = Some("chess\u{0}\u{1f}, go\u{FFFF}".into());
        let xml = read_part(&write(&profile), "word/document.xml");

        assert!(xml.contains("Teamplayer"));
        assert!(xml.contains("chess, go"));
        assert!(xml.chars().all(is_xml_char), "document.xml carries a forbidden char");
    }

    #[test]
    fn test_xml_safe_borrows_clean_text() {
        assert!(matches!(xml_safe("plain\ttext\n"), Cow::Borrowed(_)));
        assert_eq!(xml_safe("a\u{8}b\u{c}c\u{FFFE}"), "abc");
    }
}
