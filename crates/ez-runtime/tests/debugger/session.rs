//! Engine rendezvous tests: pause/resume handshakes across real threads.

use super::*;

use std::sync::Arc;
use std::thread;

use ez_runtime::debugger::{DebugSession, StepMode};
use ez_runtime::environment::Environment;
use ez_runtime::value::RuntimeError;

#[test]
fn test_rendezvous_pause_and_resume() {
    let (session, events) = DebugSession::new();
    session.initialize();
    session.set_step_mode(StepMode::Into);

    let evaluator = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            session.on_enter_call("<main>", loc(1));
            let env = Environment::root();
            let result = session.before_eval(loc(1), &[env]);
            session.on_leave_call().unwrap();
            result
        })
    };

    // The stopped event is emitted before the evaluator blocks.
    match events.recv_timeout(EVENT_TIMEOUT).unwrap() {
        DebugEvent::Stopped { location, .. } => assert_eq!(location.line, 1),
        other => panic!("expected stopped, got {other:?}"),
    }
    assert!(session.is_paused());

    session.resume();
    assert_eq!(evaluator.join().unwrap(), Ok(()));
    assert!(!session.is_paused());
}

#[test]
fn test_mode_change_releases_and_rearms() {
    let (session, events) = DebugSession::new();
    session.initialize();
    session.set_step_mode(StepMode::Into);

    let evaluator = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            session.on_enter_call("<main>", loc(1));
            let env = Environment::root();
            // Two consecutive steppable statements.
            session.before_eval(loc(1), &[env.clone()])?;
            session.before_eval(loc(2), &[env])?;
            session.on_leave_call()
        })
    };

    match events.recv_timeout(EVENT_TIMEOUT).unwrap() {
        DebugEvent::Stopped { location, .. } => assert_eq!(location.line, 1),
        other => panic!("expected stopped, got {other:?}"),
    }
    session.set_step_mode(StepMode::Into);

    // The next statement pauses again under the re-armed mode.
    match events.recv_timeout(EVENT_TIMEOUT).unwrap() {
        DebugEvent::Stopped { location, .. } => assert_eq!(location.line, 2),
        other => panic!("expected stopped, got {other:?}"),
    }
    session.resume();
    assert_eq!(evaluator.join().unwrap(), Ok(()));
}

#[test]
fn test_terminate_releases_suspended_evaluator_with_interrupt() {
    let (session, events) = DebugSession::new();
    session.initialize();
    session.set_step_mode(StepMode::Into);

    let evaluator = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            session.on_enter_call("<main>", loc(1));
            let env = Environment::root();
            session.before_eval(loc(1), &[env])
        })
    };

    match events.recv_timeout(EVENT_TIMEOUT).unwrap() {
        DebugEvent::Stopped { .. } => {}
        other => panic!("expected stopped, got {other:?}"),
    }

    session.terminate();
    assert_eq!(evaluator.join().unwrap(), Err(RuntimeError::Interrupted));
    assert!(session.is_terminated());
}

#[test]
fn test_continue_while_running_is_accepted() {
    let (session, _events) = DebugSession::new();
    session.initialize();
    // Not paused: control commands still update the mode for the next hook.
    session.set_step_mode(StepMode::Over);
    session.resume();
    assert!(!session.is_paused());
}

#[test]
fn test_stack_depth_mirrors_hook_calls() {
    let (session, _events) = DebugSession::new();
    session.initialize();

    session.on_enter_call("<main>", loc(1));
    session.on_enter_call("f", loc(2));
    session.on_enter_call("g", loc(3));
    let (trace, _) = session.stack_trace();
    assert_eq!(trace.len(), 3);

    session.on_leave_call().unwrap();
    session.on_leave_call().unwrap();
    let (trace, _) = session.stack_trace();
    assert_eq!(trace.len(), 1);

    session.on_leave_call().unwrap();
    let (trace, _) = session.stack_trace();
    assert!(trace.is_empty());
}
