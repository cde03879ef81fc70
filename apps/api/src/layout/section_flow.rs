//! Section Flow Controller: one vertical cursor per column.
//!
//! A [`ColumnFlow`] owns the cursor for a single column and appends draw ops as it
//! advances it. Every `emit_*` returns the new cursor. The cursor only ever moves
//! down. The controller does not paginate: when content passes the column's
//! bottom limit it keeps drawing and records the overflow so the caller can report it.

use crate::layout::draw::{DrawList, DrawOp, Stroke};
use crate::layout::font_metrics::TextMeasure;
use crate::layout::text_flow::{truncate, wrap};
use crate::layout::theme::{HeaderStyle, Rgb, TextStyle};
use crate::profile::proficiency::DotIndicator;

/// Horizontal span and bottom limit of a column, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub x: f32,
    pub width: f32,
    pub bottom_limit: f32,
}

impl Column {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// How a single text value is fitted to the column width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    Wrap,
    Truncate,
}

const RIGHT_TEXT_GAP: f32 = 6.0;
const BULLET: &str = "•";
const BULLET_INDENT: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotStyle {
    pub radius: f32,
    pub gap: f32,
    pub color: Rgb,
}

#[derive(Debug)]
pub struct ColumnFlow {
    column: Column,
    header: HeaderStyle,
    cursor: f32,
    ops: DrawList,
    overflowed: bool,
}

impl ColumnFlow {
    pub fn new(column: Column, header: HeaderStyle, start: f32) -> Self {
        ColumnFlow {
            column,
            header,
            cursor: start,
            ops: DrawList::new(),
            overflowed: false,
        }
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn into_ops(self) -> DrawList {
        self.ops
    }

    /// Moves the cursor down by `points`.
    pub fn space(&mut self, points: f32) -> f32 {
        self.advance(points.max(0.0))
    }

    /// Pushes an op that does not move the cursor (e.g. a portrait placed by the caller).
    pub fn draw(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    /// Header title, rule line underneath, and the header's spacing.
    pub fn emit_section_header(&mut self, title: &str) -> f32 {
        let header = self.header;
        self.space(header.space_before);
        self.line(title, self.column.x, header.text);
        self.space(2.0);
        let y = self.cursor;
        self.ops.push(DrawOp::Line {
            x1: self.column.x,
            y1: y,
            x2: self.column.right(),
            y2: y,
            stroke: Stroke {
                color: header.rule_color,
                width: header.rule_width,
            },
        });
        self.space(header.space_after)
    }

    /// Entry row: `primary` on the left with an optional right-aligned value on the
    /// same baseline, then an optional wrapped `secondary` line underneath.
    ///
    /// The primary text is truncated so it never runs into the right-aligned value.
    pub fn emit_entry(
        &mut self,
        primary: &str,
        primary_style: TextStyle,
        right_aligned: Option<(&str, TextStyle)>,
        secondary: Option<(&str, TextStyle)>,
    ) -> f32 {
        let mut primary_width = self.column.width;
        let mut leading = primary_style.leading;
        let baseline = self.cursor + primary_style.size;

        if let Some((right, style)) = right_aligned.filter(|(t, _)| !t.is_empty()) {
            let right_width = style.measure().width(right);
            self.ops.push(DrawOp::Text {
                x: self.column.right() - right_width,
                baseline,
                text: right.to_string(),
                style,
            });
            primary_width = (self.column.width - right_width - RIGHT_TEXT_GAP).max(0.0);
            leading = leading.max(style.leading);
        }

        let fitted = truncate(primary, primary_width, &primary_style.measure());
        if !fitted.is_empty() {
            self.ops.push(DrawOp::Text {
                x: self.column.x,
                baseline,
                text: fitted,
                style: primary_style,
            });
        }
        self.advance(leading);

        if let Some((text, style)) = secondary.filter(|(t, _)| !t.is_empty()) {
            self.emit_text(text, style, Fit::Wrap);
        }
        self.cursor
    }

    /// One bullet per item; each item wraps under a hanging indent.
    pub fn emit_bullets<S: AsRef<str>>(&mut self, items: &[S], style: TextStyle) -> f32 {
        let text_x = self.column.x + BULLET_INDENT;
        let text_width = (self.column.width - BULLET_INDENT).max(0.0);
        let measure = style.measure();

        for item in items {
            let lines = wrap(item.as_ref(), text_width, &measure);
            if lines.is_empty() {
                continue;
            }
            self.ops.push(DrawOp::Text {
                x: self.column.x,
                baseline: self.cursor + style.size,
                text: BULLET.to_string(),
                style,
            });
            for line in lines {
                self.line(&line, text_x, style);
            }
        }
        self.cursor
    }

    /// A free text value fitted to the column width.
    pub fn emit_text(&mut self, text: &str, style: TextStyle, fit: Fit) -> f32 {
        let measure = style.measure();
        match fit {
            Fit::Wrap => {
                for line in wrap(text, self.column.width, &measure) {
                    self.line(&line, self.column.x, style);
                }
            }
            Fit::Truncate => {
                let fitted = truncate(text.trim(), self.column.width, &measure);
                if !fitted.is_empty() {
                    self.line(&fitted, self.column.x, style);
                }
            }
        }
        self.cursor
    }

    /// Label text followed, on the same line, by `scale` dots of which `filled` are solid.
    pub fn emit_proficiency(
        &mut self,
        label: &str,
        style: TextStyle,
        dots: DotIndicator,
        dot_style: DotStyle,
    ) -> f32 {
        let measure = style.measure();
        let diameter = 2.0 * dot_style.radius;
        let dots_width =
            dots.scale() as f32 * diameter + dots.scale().saturating_sub(1) as f32 * dot_style.gap;
        let label_width = (self.column.width - dots_width - RIGHT_TEXT_GAP).max(0.0);

        let baseline = self.cursor + style.size;
        let fitted = truncate(label, label_width, &measure);
        let label_end = if fitted.is_empty() {
            self.column.x
        } else {
            let end = self.column.x + measure.width(&fitted) + RIGHT_TEXT_GAP;
            self.ops.push(DrawOp::Text {
                x: self.column.x,
                baseline,
                text: fitted,
                style,
            });
            end
        };

        let cy = baseline - style.size * 0.35;
        let stroke = Stroke {
            color: dot_style.color,
            width: 0.6,
        };
        for i in 0..dots.scale() {
            let cx = label_end + dot_style.radius + i as f32 * (diameter + dot_style.gap);
            let filled = i < dots.filled;
            self.ops.push(DrawOp::Circle {
                cx,
                cy,
                radius: dot_style.radius,
                fill: filled.then_some(dot_style.color),
                stroke: (!filled).then_some(stroke),
            });
        }
        self.advance(style.leading.max(diameter + 2.0))
    }

    fn line(&mut self, text: &str, x: f32, style: TextStyle) -> f32 {
        self.ops.push(DrawOp::Text {
            x,
            baseline: self.cursor + style.size,
            text: text.to_string(),
            style,
        });
        self.advance(style.leading)
    }

    fn advance(&mut self, points: f32) -> f32 {
        self.cursor += points;
        if self.cursor > self.column.bottom_limit {
            self.overflowed = true;
        }
        self.cursor
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::FontFace;

    const BLUE: Rgb = Rgb(0, 80, 160);

    fn style() -> TextStyle {
        TextStyle::new(FontFace::Regular, 9.0, Rgb(51, 51, 51), 12.0)
    }

    fn header() -> HeaderStyle {
        HeaderStyle {
            text: TextStyle::new(FontFace::Bold, 11.0, BLUE, 14.0),
            rule_color: BLUE,
            rule_width: 1.0,
            space_before: 14.0,
            space_after: 4.0,
        }
    }

    fn flow(width: f32, bottom: f32) -> ColumnFlow {
        ColumnFlow::new(
            Column {
                x: 100.0,
                width,
                bottom_limit: bottom,
            },
            header(),
            50.0,
        )
    }

    #[test]
    fn test_section_header_draws_title_and_rule() {
        let mut f = flow(300.0, 800.0);
        let after = f.emit_section_header("EDUCATION");
        assert_eq!(after, 50.0 + 14.0 + 14.0 + 2.0 + 4.0);
        let ops = f.into_ops();
        assert_eq!(ops.texts().collect::<Vec<_>>(), vec!["EDUCATION"]);
        assert!(ops
            .iter()
            .any(|op| matches!(op, DrawOp::Line { x1, x2, .. } if *x1 == 100.0 && *x2 == 400.0)));
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let mut f = flow(200.0, 800.0);
        let mut last = f.cursor();
        for step in [
            f.emit_section_header("SKILLS"),
            f.emit_text("Python, Go, Rust", style(), Fit::Wrap),
            f.emit_bullets(&["one", "two"], style()),
            f.space(3.0),
        ] {
            assert!(step >= last, "cursor went up: {step} < {last}");
            last = step;
        }
    }

    #[test]
    fn test_entry_right_aligned_text_ends_at_column_edge() {
        let mut f = flow(300.0, 800.0);
        let meta = TextStyle::new(FontFace::Oblique, 8.0, Rgb(102, 102, 102), 10.0);
        f.emit_entry("Bachelor", style(), Some(("2018-2022", meta)), Some(("TUIT", meta)));
        let ops = f.into_ops();

        let years = ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { x, text, style, .. } if text == "2018-2022" => Some((*x, *style)),
                _ => None,
            })
            .expect("years drawn");
        let right = years.0 + years.1.measure().width("2018-2022");
        assert!((right - 400.0).abs() < 1e-3, "right edge {right}");
        assert_eq!(ops.texts().collect::<Vec<_>>(), vec!["2018-2022", "Bachelor", "TUIT"]);
    }

    #[test]
    fn test_entry_primary_is_truncated_before_right_value() {
        let mut f = flow(120.0, 800.0);
        let long = "Principal Distinguished Staff Software Engineer";
        f.emit_entry(long, style(), Some(("2019-2024", style())), None);
        let ops = f.into_ops();
        let primary = ops.texts().find(|t| t.starts_with("Principal")).unwrap();
        assert!(primary.ends_with("..."), "{primary}");
    }

    #[test]
    fn test_bullets_wrap_with_hanging_indent() {
        let mut f = flow(80.0, 800.0);
        f.emit_bullets(&["Designed and shipped a billing platform"], style());
        let ops = f.into_ops();
        let bullet_count = ops.texts().filter(|t| *t == "•").count();
        let lines: Vec<_> = ops.iter().filter_map(|op| match op {
            DrawOp::Text { x, text, .. } if text != "•" => Some(*x),
            _ => None,
        }).collect();
        assert_eq!(bullet_count, 1);
        assert!(lines.len() > 1, "long bullet should wrap");
        assert!(lines.iter().all(|x| (*x - 108.0).abs() < 1e-3));
    }

    #[test]
    fn test_empty_bullet_items_draw_nothing() {
        let mut f = flow(200.0, 800.0);
        let before = f.cursor();
        let after = f.emit_bullets(&["", "   "], style());
        assert_eq!(before, after);
        assert!(f.into_ops().is_empty());
    }

    #[test]
    fn test_proficiency_draws_filled_then_empty_dots() {
        let mut f = flow(150.0, 800.0);
        let dots = DotIndicator::new(3, 5);
        f.emit_proficiency(
            "B1",
            style(),
            dots,
            DotStyle {
                radius: 2.0,
                gap: 2.0,
                color: BLUE,
            },
        );
        let ops = f.into_ops();
        let circles: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Circle { cx, fill, .. } => Some((*cx, fill.is_some())),
                _ => None,
            })
            .collect();
        assert_eq!(circles.len(), 5);
        assert_eq!(
            circles.iter().map(|c| c.1).collect::<Vec<_>>(),
            vec![true, true, true, false, false]
        );
        assert!(circles.windows(2).all(|w| w[0].0 < w[1].0), "dots run left to right");
    }

    #[test]
    fn test_overflow_is_recorded_not_prevented() {
        let mut f = flow(200.0, 80.0);
        assert!(!f.overflowed());
        for _ in 0..5 {
            f.emit_text("line", style(), Fit::Wrap);
        }
        assert!(f.overflowed());
        assert_eq!(f.into_ops().texts().count(), 5, "content is still drawn");
    }

    #[test]
    fn test_truncate_fit_keeps_single_line() {
        let mut f = flow(60.0, 800.0);
        let before = f.cursor();
        let after = f.emit_text("https://www.linkedin.com/in/ali-vali-1234", style(), Fit::Truncate);
        assert_eq!(after - before, 12.0);
    }
}
