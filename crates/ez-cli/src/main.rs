//! EZ command-line interface

mod commands;

use clap::{Parser, Subcommand};

/// Exit code for an unreadable or invalid source file.
pub(crate) const EXIT_BAD_SOURCE: i32 = 1;
/// Exit code for a protocol-fatal error in the debug server.
pub(crate) const EXIT_PROTOCOL: i32 = 2;

#[derive(Parser)]
#[command(name = "ez", version, about = "The EZ language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute an EZ source file
    Run {
        /// Path to the source file
        file: String,
    },
    /// Debug an EZ source file interactively
    Debug {
        /// Path to the source file
        file: String,
    },
    /// Debug an EZ source file over the JSON protocol on stdio
    Debugserver {
        /// Path to the source file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Command::Run { file } => commands::run::run(&file),
        Command::Debug { file } => commands::debug::debug(&file),
        Command::Debugserver { file } => commands::debugserver::debugserver(&file),
    };
    std::process::exit(code);
}
