//! Debug engine - the pause/resume state machine shared by both threads.
//!
//! Two actors cooperate through a [`DebugSession`]: the evaluator thread
//! calls the hook methods (`before_eval`, `on_enter_call`, `on_leave_call`)
//! synchronously during execution, and a controller thread mutates
//! breakpoints and the step mode. A single mutex guards all state; a condvar
//! is the rendezvous that suspends the evaluator while paused. Events flow
//! out through a bounded channel drained by the controller.

use std::collections::HashMap;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Condvar, Mutex};

use crate::debugger::protocol::{
    Breakpoint, DebugError, DebugEvent, SourceLocation, StackFrame, Variable,
};
use crate::debugger::state::{DebuggerState, FrameInfo, PauseSnapshot, StepMode};
use crate::environment::EnvRef;
use crate::value::RuntimeError;

/// Capacity of the engine → controller event queue.
const EVENT_QUEUE_CAPACITY: usize = 64;

/// Shared debug session handle.
///
/// Controllers and the evaluator each hold an `Arc<DebugSession>`. Every
/// operation other than a pausing `before_eval` is non-blocking and returns
/// promptly.
pub struct DebugSession {
    state: Mutex<DebuggerState>,
    resume: Condvar,
    events: SyncSender<DebugEvent>,
}

impl DebugSession {
    /// Create a session plus the receiving end of its event stream.
    pub fn new() -> (Arc<DebugSession>, Receiver<DebugEvent>) {
        let (events, receiver) = sync_channel(EVENT_QUEUE_CAPACITY);
        let session = Arc::new(DebugSession {
            state: Mutex::new(DebuggerState::new()),
            resume: Condvar::new(),
            events,
        });
        (session, receiver)
    }

    // ── Controller operations ────────────────────────────────────────────────

    /// Enable the session. Hooks are no-ops until this is called.
    pub fn initialize(&self) {
        let mut state = self.state.lock().expect("debugger state poisoned");
        state.enabled = true;
    }

    /// Arm the step mode for launch: stop on entry unless breakpoints are
    /// registered, in which case run to the first one.
    pub fn arm_for_start(&self) {
        let mut state = self.state.lock().expect("debugger state poisoned");
        let mode = if state.has_enabled_breakpoints() {
            StepMode::Continue
        } else {
            StepMode::Into
        };
        state.arm_step_mode(mode);
    }

    /// Insert a breakpoint, or return the existing one. Never fails.
    pub fn set_breakpoint(&self, file: &str, line: u32) -> Breakpoint {
        let mut state = self.state.lock().expect("debugger state poisoned");
        state.set_breakpoint(file, line)
    }

    /// Remove a breakpoint. Returns whether one existed.
    pub fn clear_breakpoint(&self, file: &str, line: u32) -> bool {
        let mut state = self.state.lock().expect("debugger state poisoned");
        state.clear_breakpoint(file, line)
    }

    /// All registered breakpoints, any enabled state.
    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        let state = self.state.lock().expect("debugger state poisoned");
        state.breakpoints()
    }

    /// Arm `mode`, capture the step depth, and release a suspended
    /// evaluator. Atomic with respect to the pause predicate.
    pub fn set_step_mode(&self, mode: StepMode) {
        let mut state = self.state.lock().expect("debugger state poisoned");
        state.arm_step_mode(mode);
        state.paused = false;
        self.resume.notify_all();
    }

    /// Equivalent to `set_step_mode(StepMode::Continue)`.
    pub fn resume(&self) {
        self.set_step_mode(StepMode::Continue);
    }

    /// End the session: disable hooks and release a suspended evaluator
    /// with the termination signal.
    pub fn terminate(&self) {
        let mut state = self.state.lock().expect("debugger state poisoned");
        state.enabled = false;
        state.terminated = true;
        state.paused = false;
        self.resume.notify_all();
    }

    /// Returns `true` while the evaluator is suspended on the rendezvous.
    pub fn is_paused(&self) -> bool {
        let state = self.state.lock().expect("debugger state poisoned");
        state.paused
    }

    /// Returns `true` once `terminate` has been called.
    pub fn is_terminated(&self) -> bool {
        let state = self.state.lock().expect("debugger state poisoned");
        state.terminated
    }

    /// Call stack snapshot, top frame first.
    ///
    /// Meaningful while paused; while running it is the last observed stack
    /// and the second return value is `true` (stale).
    pub fn stack_trace(&self) -> (Vec<StackFrame>, bool) {
        let state = self.state.lock().expect("debugger state poisoned");
        (state.stack_trace(), !state.paused)
    }

    /// Variables visible in the given frame (0 = innermost), inner scopes
    /// shadowing outer, from the last pause snapshot.
    ///
    /// The stale flag is set when the evaluator is not currently paused.
    pub fn variables(&self, frame_index: usize) -> Result<(Vec<Variable>, bool), DebugError> {
        let state = self.state.lock().expect("debugger state poisoned");
        match state.snapshot.frames.get(frame_index) {
            Some(variables) => Ok((variables.clone(), !state.paused)),
            None => Err(DebugError::InvalidFrame(frame_index)),
        }
    }

    /// Look up one variable by name along the top frame's scope chain.
    pub fn lookup_variable(&self, name: &str) -> Result<Variable, DebugError> {
        let state = self.state.lock().expect("debugger state poisoned");
        let frame = state.snapshot.frames.first().ok_or(DebugError::NotPaused)?;
        frame
            .iter()
            .find(|v| v.name == name)
            .cloned()
            .ok_or_else(|| DebugError::UnknownSymbol(name.to_string()))
    }

    /// Emit an event onto the session's event stream.
    ///
    /// Used by the evaluator runner for `output`, `error`, and `exited`.
    /// Send failures mean the controller is gone; they are ignored because
    /// the session is already shutting down at that point.
    pub fn emit(&self, event: DebugEvent) {
        let _ = self.events.send(event);
    }

    // ── Evaluator hooks ──────────────────────────────────────────────────────

    /// Hook: a function call is entered; push its frame.
    pub fn on_enter_call(&self, function_name: &str, location: SourceLocation) {
        let mut state = self.state.lock().expect("debugger state poisoned");
        if !state.enabled {
            return;
        }
        state.call_stack.push(FrameInfo {
            function_name: function_name.to_string(),
            location,
        });
    }

    /// Hook: the current call returns; pop its frame.
    ///
    /// Popping an empty stack is a hook contract violation: the session is
    /// aborted with `terminated { reason: "internal" }` and the evaluator
    /// unwinds.
    pub fn on_leave_call(&self) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("debugger state poisoned");
        if !state.enabled {
            return Ok(());
        }
        if state.call_stack.pop().is_none() {
            state.enabled = false;
            state.terminated = true;
            state.paused = false;
            self.resume.notify_all();
            drop(state);
            self.emit(DebugEvent::Terminated {
                reason: Some("internal".to_string()),
            });
            return Err(RuntimeError::Interrupted);
        }
        Ok(())
    }

    /// Hook: called immediately before evaluating a steppable statement.
    ///
    /// `frame_envs` holds one environment handle per active frame (bottom
    /// first); the last entry must be the statement's current scope. When
    /// the pause predicate fires, the variable snapshot is captured and the
    /// `stopped` event emitted *before* this thread blocks, so the
    /// controller always observes the pause.
    pub fn before_eval(
        &self,
        location: SourceLocation,
        frame_envs: &[EnvRef],
    ) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("debugger state poisoned");
        if state.terminated {
            return Err(RuntimeError::Interrupted);
        }
        if !state.enabled {
            return Ok(());
        }

        if let Some(top) = state.call_stack.last_mut() {
            top.location = location.clone();
        }

        let Some(reason) = state.should_pause(&location) else {
            return Ok(());
        };

        state.snapshot = capture_snapshot(frame_envs);
        state.paused = true;
        drop(state);

        self.emit(DebugEvent::Stopped { location, reason });

        let mut state = self.state.lock().expect("debugger state poisoned");
        while state.paused && !state.terminated {
            state = self
                .resume
                .wait(state)
                .expect("debugger state poisoned");
        }
        if state.terminated {
            return Err(RuntimeError::Interrupted);
        }
        Ok(())
    }
}

/// Render the variables visible from each frame's scope chain.
///
/// Walks every chain innermost-outward, deduplicating by name so inner
/// bindings shadow outer ones; the result is ordered top frame first with
/// names sorted for stable output. Reads the chain without mutating it.
fn capture_snapshot(frame_envs: &[EnvRef]) -> PauseSnapshot {
    let frames = frame_envs
        .iter()
        .rev()
        .map(|env| {
            let mut seen: HashMap<String, Variable> = HashMap::new();
            let mut current = Some(env.clone());
            while let Some(scope) = current {
                for (name, value) in scope.borrow().own_bindings() {
                    seen.entry(name.clone()).or_insert_with(|| {
                        Variable::new(name, value.to_display_string(), value.type_name())
                    });
                }
                current = scope.borrow().enclosing();
            }
            let mut variables: Vec<Variable> = seen.into_values().collect();
            variables.sort_by(|a, b| a.name.cmp(&b.name));
            variables
        })
        .collect();
    PauseSnapshot { frames }
}
