//! Debugserver command - JSON debug protocol over stdio

use ez_runtime::debugger::serve;

use crate::{EXIT_BAD_SOURCE, EXIT_PROTOCOL};

/// Serve the line-delimited JSON debug protocol on stdin/stdout.
pub fn debugserver(file: &str) -> i32 {
    let source = match super::read_source(file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: {error:#}");
            return EXIT_BAD_SOURCE;
        }
    };

    match serve(file, &source, std::io::stdin(), std::io::stdout().lock()) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: protocol transport failed: {error}");
            EXIT_PROTOCOL
        }
    }
}
