//! Debug command - interactive debugger REPL

use ez_runtime::debugger::{parse_command, CliDebugger, SessionState};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::EXIT_BAD_SOURCE;

/// Run the interactive debugger on a source file.
///
/// The program starts paused at its first statement; the prompt accepts the
/// `step`/`next`/`out`/`continue` family plus breakpoint and inspection
/// commands (`help` lists the full grammar).
pub fn debug(file: &str) -> i32 {
    let source = match super::read_source(file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: {error:#}");
            return EXIT_BAD_SOURCE;
        }
    };

    let mut debugger = CliDebugger::new(file, source);
    for line in debugger.launch() {
        println!("{line}");
    }
    if debugger.state() == SessionState::Terminated {
        // Launch failed (e.g. syntax errors); everything is already printed.
        return EXIT_BAD_SOURCE;
    }

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(error) => {
            eprintln!("error: failed to initialize line editor: {error}");
            return EXIT_BAD_SOURCE;
        }
    };

    loop {
        match editor.readline("(ezdb) ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                match parse_command(line) {
                    Ok(command) => {
                        for line in debugger.execute(command) {
                            println!("{line}");
                        }
                        if debugger.state() == SessionState::Terminated {
                            return 0;
                        }
                    }
                    Err(message) => eprintln!("error: {message}"),
                }
            }
            // Ctrl-C clears the line; Ctrl-D quits.
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                for line in debugger.execute(ez_runtime::debugger::CliCommand::Quit) {
                    println!("{line}");
                }
                return 0;
            }
            Err(error) => {
                eprintln!("error: {error}");
                return EXIT_BAD_SOURCE;
            }
        }
    }
}
