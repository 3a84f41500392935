//! Run command - execute EZ source files

use ez_runtime::{run_source, Value};

use crate::EXIT_BAD_SOURCE;

/// Execute a source file, printing the result to stdout.
pub fn run(file: &str) -> i32 {
    let source = match super::read_source(file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: {error:#}");
            return EXIT_BAD_SOURCE;
        }
    };

    match run_source(file, &source) {
        Ok(value) => {
            // Print the result value if it's not null
            if !matches!(value, Value::Null) {
                println!("{value}");
            }
            0
        }
        Err(errors) => {
            for error in errors {
                eprintln!("{error}");
            }
            EXIT_BAD_SOURCE
        }
    }
}
