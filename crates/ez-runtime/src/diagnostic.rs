//! Diagnostics for lexical and syntax errors
//!
//! All front-end errors flow through the unified Diagnostic type, ensuring
//! consistent formatting between the `run` and `debug` entry points.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::debugger::source_map::byte_offset_to_line_column;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Fatal error that prevents execution
    Error,
    /// Warning that doesn't prevent execution
    Warning,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with a byte offset into the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub level: DiagnosticLevel,
    /// Main diagnostic message
    pub message: String,
    /// Byte offset of the offending source
    pub offset: usize,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(message: impl Into<String>, offset: usize) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
            offset,
        }
    }

    /// Render as `FILE:LINE:COL: level: message` against the source text
    pub fn render(&self, file: &str, line_offsets: &[usize]) -> String {
        let (line, column) = byte_offset_to_line_column(self.offset, line_offsets);
        format!("{}:{}:{}: {}: {}", file, line, column, self.level, self.message)
    }
}
