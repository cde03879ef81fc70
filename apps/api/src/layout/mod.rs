// Page layout: font metrics, text flow, column cursors, and themes.
// Everything here is pure and synchronous; callers run it inside spawn_blocking.

pub mod draw;
pub mod font_metrics;
pub mod section_flow;
pub mod text_flow;
pub mod theme;
