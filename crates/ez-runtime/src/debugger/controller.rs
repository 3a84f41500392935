//! Controller-side command dispatch.
//!
//! Transport-independent: both the JSON server and the interactive CLI
//! translate their input into [`DebugCommand`]s and hand them to a
//! [`Controller`], which calls the engine and returns the immediate
//! response events. Asynchronous events (`stopped`, `output`, `exited`)
//! arrive separately through the session's event stream.

use std::sync::Arc;
use std::thread;

use crate::debugger::engine::DebugSession;
use crate::debugger::protocol::{DebugCommand, DebugEvent, ErrorCode};
use crate::debugger::source_map::{compute_line_offsets, SourceMap};
use crate::debugger::state::StepMode;
use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::RuntimeError;

/// Dispatches commands against a debug session and launches the evaluator.
pub struct Controller {
    session: Arc<DebugSession>,
    file: String,
    source: String,
    started: bool,
}

impl Controller {
    /// Create a controller for one source file.
    pub fn new(session: Arc<DebugSession>, file: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            session,
            file: file.into(),
            source: source.into(),
            started: false,
        }
    }

    /// The underlying session handle.
    pub fn session(&self) -> &Arc<DebugSession> {
        &self.session
    }

    /// Returns `true` once the evaluator thread has been launched.
    pub fn started(&self) -> bool {
        self.started
    }

    /// Handle one command, returning the events to emit in response.
    ///
    /// Control commands (`step*`, `continue`) succeed even while running:
    /// they arm the mode the next hook will observe. After `terminate` the
    /// caller should exit its loop.
    pub fn dispatch(&mut self, command: DebugCommand) -> Vec<DebugEvent> {
        match command {
            DebugCommand::Initialize { file } => {
                self.file = file;
                self.session.initialize();
                vec![DebugEvent::Initialized]
            }
            DebugCommand::Start => self.start(),
            DebugCommand::StepInto => {
                self.session.set_step_mode(StepMode::Into);
                vec![]
            }
            DebugCommand::StepOver => {
                self.session.set_step_mode(StepMode::Over);
                vec![]
            }
            DebugCommand::StepOut => {
                self.session.set_step_mode(StepMode::Out);
                vec![]
            }
            DebugCommand::Continue => {
                self.session.resume();
                vec![]
            }
            DebugCommand::SetBreakpoint { file, line } => {
                self.session.set_breakpoint(&file, line);
                vec![DebugEvent::BreakpointSet { file, line }]
            }
            DebugCommand::ClearBreakpoint { file, line } => {
                // Clearing a non-existent breakpoint is a no-op success.
                self.session.clear_breakpoint(&file, line);
                vec![DebugEvent::BreakpointCleared { file, line }]
            }
            DebugCommand::ListBreakpoints => vec![DebugEvent::Breakpoints {
                breakpoints: self.session.breakpoints(),
            }],
            DebugCommand::GetVariables { frame_index } => {
                match self.session.variables(frame_index) {
                    Ok((variables, stale)) => vec![DebugEvent::Variables { variables, stale }],
                    Err(error) => vec![error.to_event()],
                }
            }
            DebugCommand::GetStackTrace => {
                let (frames, stale) = self.session.stack_trace();
                vec![DebugEvent::StackTrace { frames, stale }]
            }
            DebugCommand::Terminate => {
                self.session.terminate();
                vec![DebugEvent::Terminated { reason: None }]
            }
        }
    }

    /// Parse the source and launch the evaluator on its own thread.
    fn start(&mut self) -> Vec<DebugEvent> {
        if self.started {
            return vec![DebugEvent::Error {
                code: ErrorCode::BadRequest,
                message: "evaluator already started".to_string(),
            }];
        }

        let (tokens, mut diagnostics) = Lexer::new(&self.source).tokenize();
        let (program, parse_diagnostics) = Parser::new(tokens).parse();
        diagnostics.extend(parse_diagnostics);
        if let Some(first) = diagnostics.first() {
            let line_offsets = compute_line_offsets(&self.source);
            return vec![DebugEvent::Error {
                code: ErrorCode::Runtime,
                message: first.render(&self.file, &line_offsets),
            }];
        }

        self.started = true;
        self.session.initialize();
        self.session.arm_for_start();

        let session = Arc::clone(&self.session);
        let source_map = SourceMap::new(&self.file, &self.source);
        thread::Builder::new()
            .name("ez-evaluator".to_string())
            .spawn(move || run_evaluator(session, program, source_map))
            .expect("failed to spawn evaluator thread");

        vec![DebugEvent::Started]
    }
}

/// Evaluator thread body: run the program under the session's hooks.
///
/// A `Terminated` wake unwinds via `RuntimeError::Interrupted` and emits
/// nothing further; runtime errors surface as `error` events followed by
/// `exited`, leaving the session serviceable.
fn run_evaluator(session: Arc<DebugSession>, program: crate::ast::Program, source_map: SourceMap) {
    let mut interpreter = Interpreter::with_debugger(source_map, Arc::clone(&session));
    match interpreter.run(&program) {
        Ok(_) => session.emit(DebugEvent::Exited),
        Err(RuntimeError::Interrupted) => {}
        Err(error) => {
            session.emit(DebugEvent::Error {
                code: ErrorCode::Runtime,
                message: error.to_string(),
            });
            session.emit(DebugEvent::Exited);
        }
    }
}
