//! Draw operations: the vector page as an ordered list of primitives.
//!
//! Coordinates are points, top-down: `y = 0` is the top edge of the page.
//! The PDF surface flips them when it encodes.

use bytes::Bytes;

use crate::layout::theme::{Rgb, TextStyle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: Stroke,
    },
    Text {
        x: f32,
        baseline: f32,
        text: String,
        style: TextStyle,
    },
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
    },
    /// A square JPEG drawn inside a circular clip of `diameter`, then ringed.
    ClippedImage {
        cx: f32,
        cy: f32,
        diameter: f32,
        jpeg: Bytes,
        pixels: u32,
        ring: Stroke,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    ops: Vec<DrawOp>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn append(&mut self, other: DrawList) {
        self.ops.extend(other.ops);
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter()
    }

    /// All text runs, in draw order.
    #[cfg(test)]
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}
