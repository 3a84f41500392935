//! Variable and stack inspection at paused frames.

use super::*;

use ez_runtime::debugger::{ErrorCode, Variable};

const SCOPES_PROGRAM: &str = "\
let x = 10;
if (true) {
    let y = 20;
    let z = x + y;
}
";

const SHADOW_PROGRAM: &str = "\
let x = 1;
if (true) {
    let x = 2;
    let y = x + 1;
}
";

const CALL_PROGRAM: &str = "\
let x = 1;
let y = twice(x);
let z = y + 1;

fn twice(n) {
    let m = n * 2;
    return m;
}
";

fn run_to_breakpoint(source: &str, line: u32) -> ServerHarness {
    let harness = ServerHarness::start(source);
    harness.send(&set_breakpoint("test.ez", line));
    harness.recv();
    harness.send(&DebugCommand::Start);
    assert_eq!(harness.recv(), DebugEvent::Started);
    assert_eq!(expect_stopped(harness.recv()).line, line);
    harness
}

#[test]
fn test_variables_across_scopes_with_shadowing_order() {
    let mut harness = run_to_breakpoint(SCOPES_PROGRAM, 4);

    harness.send(&DebugCommand::GetVariables { frame_index: 0 });
    assert_eq!(
        harness.recv(),
        DebugEvent::Variables {
            variables: vec![
                Variable::new("x", "10", "int"),
                Variable::new("y", "20", "int"),
            ],
            stale: false,
        }
    );

    harness.send(&DebugCommand::Terminate);
    harness.recv();
    harness.join().unwrap();
}

#[test]
fn test_inner_binding_shadows_outer() {
    let mut harness = run_to_breakpoint(SHADOW_PROGRAM, 4);

    harness.send(&DebugCommand::GetVariables { frame_index: 0 });
    match harness.recv() {
        DebugEvent::Variables { variables, .. } => {
            let x = variables.iter().find(|v| v.name == "x").unwrap();
            assert_eq!(x.value, "2");
            // The outer x appears once, not twice.
            assert_eq!(variables.iter().filter(|v| v.name == "x").count(), 1);
        }
        other => panic!("expected variables, got {other:?}"),
    }

    harness.send(&DebugCommand::Terminate);
    harness.recv();
    harness.join().unwrap();
}

#[test]
fn test_frame_index_out_of_range_is_invalid_frame() {
    let mut harness = run_to_breakpoint(SCOPES_PROGRAM, 4);

    // Exactly one frame is active, so index 1 == len(stack) is out of range.
    harness.send(&DebugCommand::GetVariables { frame_index: 1 });
    match harness.recv() {
        DebugEvent::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidFrame),
        other => panic!("expected error, got {other:?}"),
    }

    harness.send(&DebugCommand::Terminate);
    harness.recv();
    harness.join().unwrap();
}

#[test]
fn test_variables_before_any_pause_is_invalid_frame() {
    let mut harness = ServerHarness::start(SCOPES_PROGRAM);

    harness.send(&DebugCommand::GetVariables { frame_index: 0 });
    match harness.recv() {
        DebugEvent::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidFrame),
        other => panic!("expected error, got {other:?}"),
    }

    harness.send(&DebugCommand::Terminate);
    harness.recv();
    harness.join().unwrap();
}

#[test]
fn test_stack_trace_inside_call() {
    let mut harness = run_to_breakpoint(CALL_PROGRAM, 6);

    harness.send(&DebugCommand::GetStackTrace);
    match harness.recv() {
        DebugEvent::StackTrace { frames, stale } => {
            assert!(!stale);
            assert_eq!(frames.len(), 2);
            assert_eq!(frames[0].index, 0);
            assert_eq!(frames[0].function_name, "twice");
            assert_eq!(frames[0].line, 6);
            assert_eq!(frames[1].index, 1);
            assert_eq!(frames[1].function_name, "<main>");
            assert_eq!(frames[1].line, 2);
        }
        other => panic!("expected stack trace, got {other:?}"),
    }

    // Variables of the caller frame (index 1): the callee's locals are not
    // visible there.
    harness.send(&DebugCommand::GetVariables { frame_index: 1 });
    match harness.recv() {
        DebugEvent::Variables { variables, .. } => {
            assert!(variables.iter().any(|v| v.name == "x"));
            assert!(variables.iter().all(|v| v.name != "m" && v.name != "n"));
        }
        other => panic!("expected variables, got {other:?}"),
    }

    harness.send(&DebugCommand::Terminate);
    harness.recv();
    harness.join().unwrap();
}

#[test]
fn test_inspection_after_exit_is_stale() {
    let mut harness = ServerHarness::start(SCOPES_PROGRAM);

    harness.send(&DebugCommand::Start);
    assert_eq!(harness.recv(), DebugEvent::Started);
    expect_stopped(harness.recv());
    harness.send(&DebugCommand::Continue);
    assert_eq!(harness.recv(), DebugEvent::Exited);

    harness.send(&DebugCommand::GetStackTrace);
    match harness.recv() {
        DebugEvent::StackTrace { stale, .. } => assert!(stale),
        other => panic!("expected stack trace, got {other:?}"),
    }

    // The last pause snapshot still answers, flagged stale.
    harness.send(&DebugCommand::GetVariables { frame_index: 0 });
    match harness.recv() {
        DebugEvent::Variables { stale, .. } => assert!(stale),
        other => panic!("expected variables, got {other:?}"),
    }

    harness.send(&DebugCommand::Terminate);
    harness.recv();
    harness.join().unwrap();
}
