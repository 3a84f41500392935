//! Interactive debugger core (UI-agnostic).
//!
//! Command grammar parsing and event rendering for the human-facing
//! debugger, plus [`CliDebugger`], the synchronous session driver the `ez
//! debug` front end wraps with a line editor. Keeping this free of any
//! terminal dependency makes the whole surface unit-testable.

use std::sync::mpsc::Receiver;

use crate::debugger::controller::Controller;
use crate::debugger::engine::DebugSession;
use crate::debugger::protocol::{DebugCommand, DebugEvent};
use crate::debugger::state::StepMode;

/// A parsed CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// `step` / `s`
    StepInto,
    /// `next` / `n`
    StepOver,
    /// `out` / `o`
    StepOut,
    /// `continue` / `c`
    Continue,
    /// `break FILE:LINE` / `b FILE:LINE`
    Break { file: String, line: u32 },
    /// `clear FILE:LINE`
    Clear { file: String, line: u32 },
    /// `breakpoints` / `bp`
    Breakpoints,
    /// `print NAME` / `p NAME`
    Print { name: String },
    /// `vars` / `v`
    Vars,
    /// `stack` / `st`
    Stack,
    /// `help` / `h`
    Help,
    /// `quit` / `q`
    Quit,
}

/// Help text listing the command grammar.
pub const HELP_TEXT: &str = "\
commands:
  step|s             pause at the next statement, entering calls
  next|n             pause at the next statement, skipping calls
  out|o              run until the current function returns
  continue|c         run until the next breakpoint
  break|b FILE:LINE  set a breakpoint
  clear FILE:LINE    remove a breakpoint
  breakpoints|bp     list breakpoints
  print|p NAME       print one variable
  vars|v             print variables in the current frame
  stack|st           print the call stack
  help|h             show this help
  quit|q             terminate the session";

/// Parse one input line. Verbs are case-insensitive.
pub fn parse_command(line: &str) -> Result<CliCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_string());
    };
    let verb = verb.to_ascii_lowercase();
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments for '{verb}'"));
    }

    let command = match (verb.as_str(), arg) {
        ("step" | "s", None) => CliCommand::StepInto,
        ("next" | "n", None) => CliCommand::StepOver,
        ("out" | "o", None) => CliCommand::StepOut,
        ("continue" | "c", None) => CliCommand::Continue,
        ("break" | "b", Some(target)) => {
            let (file, line) = parse_location(target)?;
            CliCommand::Break { file, line }
        }
        ("clear", Some(target)) => {
            let (file, line) = parse_location(target)?;
            CliCommand::Clear { file, line }
        }
        ("breakpoints" | "bp", None) => CliCommand::Breakpoints,
        ("print" | "p", Some(name)) => CliCommand::Print {
            name: name.to_string(),
        },
        ("vars" | "v", None) => CliCommand::Vars,
        ("stack" | "st", None) => CliCommand::Stack,
        ("help" | "h", None) => CliCommand::Help,
        ("quit" | "q", None) => CliCommand::Quit,
        ("break" | "b" | "clear", None) => {
            return Err(format!("'{verb}' expects FILE:LINE"));
        }
        ("print" | "p", None) => return Err("'print' expects a variable name".to_string()),
        _ => return Err(format!("unknown command '{verb}' (try 'help')")),
    };
    Ok(command)
}

/// Parse a `FILE:LINE` breakpoint target.
fn parse_location(target: &str) -> Result<(String, u32), String> {
    let Some((file, line)) = target.rsplit_once(':') else {
        return Err(format!("expected FILE:LINE, got '{target}'"));
    };
    let line: u32 = line
        .parse()
        .map_err(|_| format!("invalid line number '{line}'"))?;
    if file.is_empty() {
        return Err(format!("expected FILE:LINE, got '{target}'"));
    }
    Ok((file.to_string(), line))
}

/// Render one event for the terminal.
pub fn render_event(event: &DebugEvent) -> String {
    match event {
        DebugEvent::Initialized => "initialized".to_string(),
        DebugEvent::Started => "started".to_string(),
        DebugEvent::Stopped { location, .. } => format!("→ Paused at {location}"),
        DebugEvent::Output { text } => text.clone(),
        DebugEvent::Exited => "program exited".to_string(),
        DebugEvent::Terminated { reason: Some(r) } => format!("terminated ({r})"),
        DebugEvent::Terminated { reason: None } => "terminated".to_string(),
        DebugEvent::BreakpointSet { file, line } => {
            format!("breakpoint set at {file}:{line}")
        }
        DebugEvent::BreakpointCleared { file, line } => {
            format!("breakpoint cleared at {file}:{line}")
        }
        DebugEvent::Breakpoints { breakpoints } => {
            if breakpoints.is_empty() {
                "no breakpoints".to_string()
            } else {
                breakpoints
                    .iter()
                    .map(|bp| {
                        let state = if bp.enabled { "" } else { " (disabled)" };
                        format!("{}:{}{}", bp.file, bp.line, state)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        DebugEvent::Variables { variables, stale } => {
            let mut lines: Vec<String> = variables
                .iter()
                .map(|v| format!("{} = {} ({})", v.name, v.value, v.type_name))
                .collect();
            if lines.is_empty() {
                lines.push("no variables".to_string());
            }
            if *stale {
                lines.push("(stale: evaluator is running)".to_string());
            }
            lines.join("\n")
        }
        DebugEvent::StackTrace { frames, .. } => frames
            .iter()
            .map(|f| {
                format!(
                    "#{} {} at {}:{}:{}",
                    f.index, f.function_name, f.file, f.line, f.column
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        DebugEvent::Error { message, .. } => format!("error: {message}"),
    }
}

// ── CliDebugger ──────────────────────────────────────────────────────────────

/// What happened to the session after executing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Evaluator paused or idle; keep prompting.
    Active,
    /// Evaluator finished; inspection still works until `quit`.
    Exited,
    /// Session is over; the caller should stop prompting.
    Terminated,
}

/// Synchronous driver for the interactive debugger.
///
/// Control commands block until the matching `stopped` (or `exited`) event
/// arrives; output events received while waiting are rendered in order.
pub struct CliDebugger {
    controller: Controller,
    events: Receiver<DebugEvent>,
    state: SessionState,
}

impl CliDebugger {
    /// Create a debugger for one source file.
    pub fn new(file: impl Into<String>, source: impl Into<String>) -> Self {
        let (session, events) = DebugSession::new();
        Self {
            controller: Controller::new(session, file, source),
            events,
            state: SessionState::Active,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Launch the evaluator, paused at the first statement. Returns the
    /// rendered lines to print before the first prompt.
    pub fn launch(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        for event in self.controller.dispatch(DebugCommand::Start) {
            lines.push(render_event(&event));
        }
        if self.controller.started() {
            lines.extend(self.wait_for_stop());
        } else {
            self.state = SessionState::Terminated;
        }
        lines
    }

    /// Execute one parsed command, returning the lines to print.
    pub fn execute(&mut self, command: CliCommand) -> Vec<String> {
        match command {
            CliCommand::StepInto => self.control(StepMode::Into),
            CliCommand::StepOver => self.control(StepMode::Over),
            CliCommand::StepOut => self.control(StepMode::Out),
            CliCommand::Continue => self.control(StepMode::Continue),
            CliCommand::Break { file, line } => {
                self.dispatch(DebugCommand::SetBreakpoint { file, line })
            }
            CliCommand::Clear { file, line } => {
                self.dispatch(DebugCommand::ClearBreakpoint { file, line })
            }
            CliCommand::Breakpoints => self.dispatch(DebugCommand::ListBreakpoints),
            CliCommand::Print { name } => {
                match self.controller.session().lookup_variable(&name) {
                    Ok(variable) => vec![format!("{} = {}", variable.name, variable.value)],
                    Err(_) => vec!["not found".to_string()],
                }
            }
            CliCommand::Vars => self.dispatch(DebugCommand::GetVariables { frame_index: 0 }),
            CliCommand::Stack => self.dispatch(DebugCommand::GetStackTrace),
            CliCommand::Help => vec![HELP_TEXT.to_string()],
            CliCommand::Quit => {
                let lines = self.dispatch(DebugCommand::Terminate);
                self.state = SessionState::Terminated;
                lines
            }
        }
    }

    fn dispatch(&mut self, command: DebugCommand) -> Vec<String> {
        self.controller
            .dispatch(command)
            .iter()
            .map(render_event)
            .collect()
    }

    /// Arm a step mode and wait for the evaluator to stop again.
    fn control(&mut self, mode: StepMode) -> Vec<String> {
        match self.state {
            SessionState::Exited => return vec!["program exited".to_string()],
            SessionState::Terminated => return vec!["terminated".to_string()],
            SessionState::Active => {}
        }
        self.controller.session().set_step_mode(mode);
        self.wait_for_stop()
    }

    /// Drain events until the evaluator stops, exits, or terminates.
    fn wait_for_stop(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let Ok(event) = self.events.recv() else {
                self.state = SessionState::Terminated;
                break;
            };
            lines.push(render_event(&event));
            match event {
                DebugEvent::Stopped { .. } => break,
                DebugEvent::Exited => {
                    self.state = SessionState::Exited;
                    break;
                }
                DebugEvent::Terminated { .. } => {
                    self.state = SessionState::Terminated;
                    break;
                }
                _ => {}
            }
        }
        lines
    }
}
