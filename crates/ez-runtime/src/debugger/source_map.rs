//! Source map - resolving AST spans to (file, line, column) locations.

use crate::debugger::protocol::SourceLocation;
use crate::span::Span;

// ── Line offset computation ───────────────────────────────────────────────────

/// Compute the byte offset of each line's start in `source`.
///
/// Returns a `Vec` where `result[i]` is the byte offset of line `i+1`
/// (0-indexed). Line 1 always starts at offset 0.
pub fn compute_line_offsets(source: &str) -> Vec<usize> {
    let mut offsets = vec![0usize]; // line 1 starts at 0
    for (i, ch) in source.char_indices() {
        if ch == '\n' {
            offsets.push(i + 1);
        }
    }
    offsets
}

/// Convert a byte offset to a 1-based `(line, column)` pair.
///
/// Uses the pre-computed `line_offsets` table from [`compute_line_offsets`].
pub fn byte_offset_to_line_column(offset: usize, line_offsets: &[usize]) -> (u32, u32) {
    // Binary search for the greatest line start ≤ offset.
    let line_index = match line_offsets.binary_search(&offset) {
        Ok(i) => i,      // offset is exactly at a line start
        Err(i) => i - 1, // offset is within line i-1 (0-based)
    };
    let line_start = line_offsets[line_index];
    let column = offset.saturating_sub(line_start);
    ((line_index + 1) as u32, (column + 1) as u32)
}

// ── SourceMap ─────────────────────────────────────────────────────────────────

/// Maps AST spans of one source file to source locations.
#[derive(Debug, Clone)]
pub struct SourceMap {
    file: String,
    line_offsets: Vec<usize>,
}

impl SourceMap {
    /// Build a source map for `file` from its source text.
    pub fn new(file: impl Into<String>, source: &str) -> Self {
        Self {
            file: file.into(),
            line_offsets: compute_line_offsets(source),
        }
    }

    /// Source file name this map covers.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Resolve a span's start offset to a source location.
    pub fn location(&self, span: Span) -> SourceLocation {
        let (line, column) = byte_offset_to_line_column(span.start, &self.line_offsets);
        SourceLocation::new(&self.file, line, column)
    }
}
