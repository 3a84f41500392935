//! EZ Runtime - core language implementation
//!
//! This library provides the EZ language runtime including:
//! - Lexical analysis and parsing
//! - Tree-walking interpretation
//! - The debugger core: pause/resume engine, breakpoints, step semantics,
//!   environment inspection, and the JSON/CLI controller transports

/// EZ runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod ast;
pub mod debugger;
pub mod diagnostic;
pub mod environment;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
pub mod value;

// Re-export commonly used types
pub use ast::Program;
pub use debugger::DebugSession;
pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use interpreter::Interpreter;
pub use lexer::Lexer;
pub use parser::Parser;
pub use span::Span;
pub use token::{Token, TokenKind};
pub use value::{RuntimeError, Value};

use debugger::SourceMap;

/// Lex and parse `source`, collecting all front-end diagnostics.
pub fn parse_source(source: &str) -> (Program, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) = Lexer::new(source).tokenize();
    let (program, parse_diagnostics) = Parser::new(tokens).parse();
    diagnostics.extend(parse_diagnostics);
    (program, diagnostics)
}

/// Parse and execute `source` without a debugger attached.
///
/// Returns the last statement's value, or the diagnostics/runtime error
/// rendered as display strings for the caller to report.
pub fn run_source(file: &str, source: &str) -> Result<Value, Vec<String>> {
    let (program, diagnostics) = parse_source(source);
    if !diagnostics.is_empty() {
        let line_offsets = debugger::source_map::compute_line_offsets(source);
        return Err(diagnostics
            .iter()
            .map(|d| d.render(file, &line_offsets))
            .collect());
    }
    Interpreter::new(SourceMap::new(file, source))
        .run(&program)
        .map_err(|e| vec![format!("{file}: runtime error: {e}")])
}
