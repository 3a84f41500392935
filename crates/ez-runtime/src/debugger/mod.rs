//! EZ debugger core.
//!
//! The debug control engine and its two controller transports. The
//! interpreter calls the [`engine::DebugSession`] hooks synchronously; a
//! controller thread (JSON server or interactive CLI) mutates breakpoints
//! and the step mode and drains the event stream.

pub mod cli;
pub mod controller;
pub mod engine;
pub mod protocol;
pub mod server;
pub mod source_map;
pub mod state;

pub use cli::{parse_command, render_event, CliCommand, CliDebugger, SessionState};
pub use controller::Controller;
pub use engine::DebugSession;
pub use protocol::{
    decode_command, decode_event, encode_command, encode_event, Breakpoint, DebugCommand,
    DebugError, DebugEvent, ErrorCode, PauseReason, SourceLocation, StackFrame, Variable,
};
pub use server::serve;
pub use source_map::SourceMap;
pub use state::StepMode;
