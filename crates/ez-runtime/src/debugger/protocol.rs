//! Debugger protocol - command/event types and the line-delimited JSON wire.
//!
//! All types are serde-serializable so a debugger client (IDE, CLI, test
//! harness) can drive a session over any line-oriented byte stream. The wire
//! format is one JSON object per line:
//!
//! - request: `{"type":"command","command":<string>,"params":{...}}`
//! - event:   `{"type":"event","event":<string>,"data":{...}}`

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Source location ───────────────────────────────────────────────────────────

/// A position in a source file (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file path.
    pub file: String,
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based).
    pub column: u32,
}

impl SourceLocation {
    /// Create a source location.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ── Breakpoint ────────────────────────────────────────────────────────────────

/// A registered breakpoint, identified by `(file, line)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Source file the breakpoint was requested against.
    pub file: String,
    /// Line number (1-based).
    pub line: u32,
    /// Disabled breakpoints are retained but never trigger.
    pub enabled: bool,
    /// Reserved for a future condition expression; carried but never
    /// evaluated.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub condition: Option<String>,
}

impl Breakpoint {
    /// Create an enabled, unconditional breakpoint.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            enabled: true,
            condition: None,
        }
    }
}

// ── Stack frame ───────────────────────────────────────────────────────────────

/// A frame in the call stack (for stack traces).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    /// Frame index: 0 = innermost (current), higher = outer.
    pub index: usize,
    /// Function name (`<main>` for top-level code).
    pub function_name: String,
    /// Source file of the frame's current statement.
    pub file: String,
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based).
    pub column: u32,
}

// ── Variable ──────────────────────────────────────────────────────────────────

/// A named variable with its rendered value and type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name.
    pub name: String,
    /// Human-readable representation of the value.
    pub value: String,
    /// EZ type name (e.g. `int`, `string`, `array`).
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Variable {
    /// Create a new variable record.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            type_name: type_name.into(),
        }
    }
}

// ── Pause reason ─────────────────────────────────────────────────────────────

/// Why execution was paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseReason {
    /// A breakpoint was hit.
    Breakpoint,
    /// A step operation completed.
    Step,
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Error codes carried by `error` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Malformed command or unknown verb.
    BadRequest,
    /// Stack index out of range.
    InvalidFrame,
    /// Variable lookup miss.
    UnknownSymbol,
    /// Inspection while still running; answered with a stale snapshot.
    NotPaused,
    /// Session is over.
    Terminated,
    /// Invariant violation inside the debugger.
    Internal,
    /// The program under debug raised a runtime error.
    Runtime,
}

/// Errors surfaced by engine operations and transports.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DebugError {
    /// Malformed command or unknown verb.
    #[error("{0}")]
    BadRequest(String),
    /// Stack index out of range.
    #[error("frame index {0} out of range")]
    InvalidFrame(usize),
    /// Variable lookup miss.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
    /// Inspection while still running.
    #[error("not paused")]
    NotPaused,
    /// Session is over.
    #[error("session terminated")]
    Terminated,
    /// Invariant violation inside the debugger.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DebugError {
    /// The wire-level error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DebugError::BadRequest(_) => ErrorCode::BadRequest,
            DebugError::InvalidFrame(_) => ErrorCode::InvalidFrame,
            DebugError::UnknownSymbol(_) => ErrorCode::UnknownSymbol,
            DebugError::NotPaused => ErrorCode::NotPaused,
            DebugError::Terminated => ErrorCode::Terminated,
            DebugError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Convert into an `error` event.
    pub fn to_event(&self) -> DebugEvent {
        DebugEvent::Error {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────────────────

/// Commands sent from a controller to the debug session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "params", rename_all = "camelCase")]
pub enum DebugCommand {
    /// Mark the session enabled and record the file under debug.
    Initialize {
        /// Source file reference.
        file: String,
    },
    /// Launch the evaluator.
    Start,
    /// Pause at the next steppable statement, any depth.
    StepInto,
    /// Pause at the next statement at the same or a shallower depth.
    StepOver,
    /// Pause once the current function has returned.
    StepOut,
    /// Run until the next breakpoint.
    Continue,
    /// Register a breakpoint.
    SetBreakpoint {
        /// Source file.
        file: String,
        /// Line number (1-based).
        line: u32,
    },
    /// Remove a breakpoint; succeeds even if none exists.
    ClearBreakpoint {
        /// Source file.
        file: String,
        /// Line number (1-based).
        line: u32,
    },
    /// List all registered breakpoints.
    ListBreakpoints,
    /// Snapshot variables visible in a stack frame.
    #[serde(rename_all = "camelCase")]
    GetVariables {
        /// 0 = innermost frame.
        frame_index: usize,
    },
    /// Snapshot the call stack, top first.
    GetStackTrace,
    /// End the session, releasing a suspended evaluator.
    Terminate,
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Events emitted by the debug session to its controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum DebugEvent {
    /// Session is configured.
    Initialized,
    /// Evaluator thread launched.
    Started,
    /// Evaluator suspended at a known location.
    Stopped {
        /// Where execution paused.
        location: SourceLocation,
        /// Why execution paused.
        reason: PauseReason,
    },
    /// Program output produced during execution.
    Output {
        /// Output text, without trailing newline.
        text: String,
    },
    /// Evaluator finished normally or after a runtime error.
    Exited,
    /// Session is over.
    Terminated {
        /// Present when termination was not user-requested (e.g.
        /// `"internal"` after a hook contract violation).
        #[serde(skip_serializing_if = "Option::is_none", default)]
        reason: Option<String>,
    },
    /// A breakpoint was registered.
    BreakpointSet {
        /// Source file.
        file: String,
        /// Line number (1-based).
        line: u32,
    },
    /// A breakpoint was removed (or did not exist).
    BreakpointCleared {
        /// Source file.
        file: String,
        /// Line number (1-based).
        line: u32,
    },
    /// All registered breakpoints.
    Breakpoints {
        /// Registered breakpoints in registration order.
        breakpoints: Vec<Breakpoint>,
    },
    /// Variables visible in the requested frame.
    Variables {
        /// Deduplicated (inner shadows outer) variable list.
        variables: Vec<Variable>,
        /// Set when answered from a stale snapshot while running.
        #[serde(skip_serializing_if = "std::ops::Not::not", default)]
        stale: bool,
    },
    /// Call stack snapshot, top first.
    StackTrace {
        /// Frames, index 0 innermost.
        frames: Vec<StackFrame>,
        /// Set when answered from a stale snapshot while running.
        #[serde(skip_serializing_if = "std::ops::Not::not", default)]
        stale: bool,
    },
    /// A command failed or the evaluator raised an error.
    Error {
        /// Machine-readable error kind.
        code: ErrorCode,
        /// Human-readable description.
        message: String,
    },
}

// ── Wire framing ─────────────────────────────────────────────────────────────

/// Encode an event as a single wire line (without trailing newline).
pub fn encode_event(event: &DebugEvent) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(event)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("type".to_string(), serde_json::Value::from("event"));
    }
    serde_json::to_string(&value)
}

/// Decode one wire line into a command.
///
/// Fails with `BadRequest` on malformed JSON, a missing or wrong `type`
/// field, an unknown command, or missing parameters. Unrecognized extra
/// fields are ignored.
pub fn decode_command(line: &str) -> Result<DebugCommand, DebugError> {
    let mut value: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| DebugError::BadRequest(format!("malformed JSON: {e}")))?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| DebugError::BadRequest("expected a JSON object".to_string()))?;

    match object.remove("type") {
        Some(serde_json::Value::String(s)) if s == "command" => {}
        _ => {
            return Err(DebugError::BadRequest(
                "missing or invalid \"type\" field; expected \"command\"".to_string(),
            ))
        }
    }

    serde_json::from_value(value).map_err(|e| DebugError::BadRequest(format!("bad command: {e}")))
}

/// Decode one wire line into an event (used by clients and tests).
pub fn decode_event(line: &str) -> Result<DebugEvent, DebugError> {
    let mut value: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| DebugError::BadRequest(format!("malformed JSON: {e}")))?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| DebugError::BadRequest("expected a JSON object".to_string()))?;

    match object.remove("type") {
        Some(serde_json::Value::String(s)) if s == "event" => {}
        _ => {
            return Err(DebugError::BadRequest(
                "missing or invalid \"type\" field; expected \"event\"".to_string(),
            ))
        }
    }

    serde_json::from_value(value).map_err(|e| DebugError::BadRequest(format!("bad event: {e}")))
}

/// Encode a command as a single wire line (used by clients and tests).
pub fn encode_command(command: &DebugCommand) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(command)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("type".to_string(), serde_json::Value::from("command"));
    }
    serde_json::to_string(&value)
}
