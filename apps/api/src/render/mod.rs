// Document rendering: block planning, portrait processing, and the two output surfaces.
// Composition is synchronous; handlers move it onto the blocking pool.

pub mod blocks;
pub mod compose;
pub mod docx;
pub mod handlers;
pub mod pdf;
pub mod portrait;
