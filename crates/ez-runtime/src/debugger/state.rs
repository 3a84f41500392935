//! Debugger state management.
//!
//! Pure state and the pause predicate, with no threading concerns. The
//! engine wraps this in its mutex; everything here is synchronous and
//! side-effect free so the pause decision can be tested exhaustively.

use std::collections::HashMap;

use crate::debugger::protocol::{
    Breakpoint, PauseReason, SourceLocation, StackFrame, Variable,
};

// ── StepMode ─────────────────────────────────────────────────────────────────

/// Which step operation is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// Run until the next breakpoint.
    Continue,
    /// Pause at the next steppable statement, any depth.
    Into,
    /// Pause at the next statement at the same or a shallower depth.
    Over,
    /// Pause once the current function has returned.
    Out,
}

// ── Call frames ──────────────────────────────────────────────────────────────

/// Engine-side record of one active call frame.
///
/// The evaluator owns the frame's environment; the engine tracks only the
/// metadata needed for stack traces and depth comparisons.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Function name (`<main>` for the program root).
    pub function_name: String,
    /// Location of the statement currently executing in this frame.
    pub location: SourceLocation,
}

// ── Pause snapshot ───────────────────────────────────────────────────────────

/// Variables captured per frame at the moment of a pause, top frame first.
///
/// Built by the evaluator thread before it blocks, so the controller can
/// answer inspection commands without touching live interpreter state.
#[derive(Debug, Clone, Default)]
pub struct PauseSnapshot {
    /// `frames[0]` is the innermost frame's deduplicated variable list.
    pub frames: Vec<Vec<Variable>>,
}

// ── DebuggerState ─────────────────────────────────────────────────────────────

/// Complete mutable state of a debug session.
///
/// The evaluator consults this before every steppable statement to decide
/// whether to pause; controllers mutate breakpoints and the step mode.
#[derive(Debug)]
pub struct DebuggerState {
    /// Hooks are no-ops when disabled.
    pub enabled: bool,
    /// Active step mode.
    pub step_mode: StepMode,
    /// Call-frame depth captured when the step mode was last armed.
    pub step_depth: usize,
    /// Active call frames, bottom first (`last()` is the innermost).
    pub call_stack: Vec<FrameInfo>,
    /// Breakpoints keyed file → line.
    breakpoints: HashMap<String, HashMap<u32, Breakpoint>>,
    /// True while the evaluator is suspended on the rendezvous.
    pub paused: bool,
    /// Set by `terminate`; a waking evaluator must unwind.
    pub terminated: bool,
    /// Variables captured at the most recent pause.
    pub snapshot: PauseSnapshot,
}

impl DebuggerState {
    /// Create a fresh state (disabled, no breakpoints, free-running).
    pub fn new() -> Self {
        Self {
            enabled: false,
            step_mode: StepMode::Continue,
            step_depth: 0,
            call_stack: Vec::new(),
            breakpoints: HashMap::new(),
            paused: false,
            terminated: false,
            snapshot: PauseSnapshot::default(),
        }
    }

    // ── Breakpoint management ─────────────────────────────────────────────────

    /// Insert a breakpoint, or return the existing one. Idempotent.
    pub fn set_breakpoint(&mut self, file: &str, line: u32) -> Breakpoint {
        self.breakpoints
            .entry(file.to_string())
            .or_default()
            .entry(line)
            .or_insert_with(|| Breakpoint::new(file, line))
            .clone()
    }

    /// Remove a breakpoint. Returns whether one existed.
    pub fn clear_breakpoint(&mut self, file: &str, line: u32) -> bool {
        let Some(lines) = self.breakpoints.get_mut(file) else {
            return false;
        };
        let removed = lines.remove(&line).is_some();
        if lines.is_empty() {
            self.breakpoints.remove(file);
        }
        removed
    }

    /// Enable or disable a breakpoint in place. Returns whether it existed.
    pub fn set_breakpoint_enabled(&mut self, file: &str, line: u32, enabled: bool) -> bool {
        if let Some(bp) = self
            .breakpoints
            .get_mut(file)
            .and_then(|lines| lines.get_mut(&line))
        {
            bp.enabled = enabled;
            true
        } else {
            false
        }
    }

    /// All registered breakpoints, sorted by file then line.
    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        let mut all: Vec<Breakpoint> = self
            .breakpoints
            .values()
            .flat_map(|lines| lines.values().cloned())
            .collect();
        all.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
        all
    }

    /// Returns `true` if any enabled breakpoint is registered.
    pub fn has_enabled_breakpoints(&self) -> bool {
        self.breakpoints
            .values()
            .any(|lines| lines.values().any(|bp| bp.enabled))
    }

    /// Returns `true` if an enabled breakpoint covers `location`.
    ///
    /// File comparison uses the basename-insensitive form: paths match when
    /// their final components compare equal ignoring ASCII case.
    pub fn breakpoint_hit(&self, location: &SourceLocation) -> bool {
        self.breakpoints.iter().any(|(file, lines)| {
            same_source_file(file, &location.file)
                && lines.get(&location.line).is_some_and(|bp| bp.enabled)
        })
    }

    // ── Step mode ─────────────────────────────────────────────────────────────

    /// Arm a step mode, capturing the current call depth as the reference
    /// point for the depth comparisons.
    pub fn arm_step_mode(&mut self, mode: StepMode) {
        self.step_mode = mode;
        self.step_depth = self.call_stack.len();
    }

    // ── Pause predicate ──────────────────────────────────────────────────────

    /// Decide whether to pause at `location` with the current stack depth.
    pub fn should_pause(&self, location: &SourceLocation) -> Option<PauseReason> {
        if self.breakpoint_hit(location) {
            return Some(PauseReason::Breakpoint);
        }
        let depth = self.call_stack.len();
        let pause = match self.step_mode {
            StepMode::Continue => false,
            StepMode::Into => true,
            StepMode::Over => depth <= self.step_depth,
            StepMode::Out => depth < self.step_depth,
        };
        pause.then_some(PauseReason::Step)
    }

    // ── Stack trace ──────────────────────────────────────────────────────────

    /// Snapshot of the call stack, top frame first.
    pub fn stack_trace(&self) -> Vec<StackFrame> {
        self.call_stack
            .iter()
            .rev()
            .enumerate()
            .map(|(index, frame)| StackFrame {
                index,
                function_name: frame.function_name.clone(),
                file: frame.location.file.clone(),
                line: frame.location.line,
                column: frame.location.column,
            })
            .collect()
    }
}

impl Default for DebuggerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare two source paths by final path component, ignoring ASCII case.
pub fn same_source_file(a: &str, b: &str) -> bool {
    basename(a).eq_ignore_ascii_case(basename(b))
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
