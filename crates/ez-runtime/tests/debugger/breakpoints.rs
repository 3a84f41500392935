//! Breakpoint behavior over the JSON server transport.

use super::*;

const FIVE_LINES: &str = "\
let a = 1;
let b = 2;
let c = a + b;
let d = c * 2;
let e = d - 1;
";

// A call on line 2 whose body sits below blank line 4; lines 4 and 5 carry
// no steppable statement.
const CALL_PROGRAM: &str = "\
let x = 1;
let y = twice(x);
let z = y + 1;

fn twice(n) {
    let m = n * 2;
    return m;
}
";

#[test]
fn test_breakpoint_hit_then_continue_to_exit() {
    let mut harness = ServerHarness::start(FIVE_LINES);

    harness.send(&DebugCommand::Initialize {
        file: "test.ez".to_string(),
    });
    assert_eq!(harness.recv(), DebugEvent::Initialized);

    harness.send(&set_breakpoint("test.ez", 3));
    assert_eq!(
        harness.recv(),
        DebugEvent::BreakpointSet {
            file: "test.ez".to_string(),
            line: 3,
        }
    );

    harness.send(&DebugCommand::Start);
    assert_eq!(harness.recv(), DebugEvent::Started);

    match harness.recv() {
        DebugEvent::Stopped { location, reason } => {
            assert_eq!(location, SourceLocation::new("test.ez", 3, 1));
            assert_eq!(reason, ez_runtime::debugger::PauseReason::Breakpoint);
        }
        other => panic!("expected stopped, got {other:?}"),
    }

    harness.send(&DebugCommand::Continue);
    assert_eq!(harness.recv(), DebugEvent::Exited);

    harness.send(&DebugCommand::Terminate);
    assert_eq!(harness.recv(), DebugEvent::Terminated { reason: None });
    harness.join().unwrap();
    harness.expect_silence();
}

#[test]
fn test_set_breakpoint_is_idempotent() {
    let mut harness = ServerHarness::start(FIVE_LINES);

    harness.send(&set_breakpoint("test.ez", 3));
    harness.recv();
    harness.send(&set_breakpoint("test.ez", 3));
    harness.recv();

    harness.send(&DebugCommand::ListBreakpoints);
    match harness.recv() {
        DebugEvent::Breakpoints { breakpoints } => {
            assert_eq!(breakpoints.len(), 1);
            assert_eq!(breakpoints[0].file, "test.ez");
            assert_eq!(breakpoints[0].line, 3);
            assert!(breakpoints[0].enabled);
        }
        other => panic!("expected breakpoints, got {other:?}"),
    }

    harness.send(&DebugCommand::Terminate);
    harness.recv();
    harness.join().unwrap();
}

#[test]
fn test_clear_breakpoint_removes_and_is_noop_when_missing() {
    let mut harness = ServerHarness::start(FIVE_LINES);

    harness.send(&set_breakpoint("test.ez", 2));
    harness.recv();

    harness.send(&DebugCommand::ClearBreakpoint {
        file: "test.ez".to_string(),
        line: 2,
    });
    assert_eq!(
        harness.recv(),
        DebugEvent::BreakpointCleared {
            file: "test.ez".to_string(),
            line: 2,
        }
    );

    harness.send(&DebugCommand::ListBreakpoints);
    assert_eq!(
        harness.recv(),
        DebugEvent::Breakpoints {
            breakpoints: vec![]
        }
    );

    // Clearing again is a no-op success.
    harness.send(&DebugCommand::ClearBreakpoint {
        file: "test.ez".to_string(),
        line: 2,
    });
    assert_eq!(
        harness.recv(),
        DebugEvent::BreakpointCleared {
            file: "test.ez".to_string(),
            line: 2,
        }
    );

    harness.send(&DebugCommand::Terminate);
    harness.recv();
    harness.join().unwrap();
}

#[test]
fn test_breakpoint_on_non_steppable_line_never_triggers() {
    let mut harness = ServerHarness::start(CALL_PROGRAM);

    // Line 4 is blank; line 5 is a function declaration.
    harness.send(&set_breakpoint("test.ez", 4));
    harness.recv();
    harness.send(&set_breakpoint("test.ez", 5));
    harness.recv();

    harness.send(&DebugCommand::Start);
    assert_eq!(harness.recv(), DebugEvent::Started);
    // Runs to completion without stopping.
    assert_eq!(harness.recv(), DebugEvent::Exited);

    harness.send(&DebugCommand::Terminate);
    harness.recv();
    harness.join().unwrap();
}

#[test]
fn test_breakpoint_matches_file_basename_case_insensitively() {
    let mut harness = ServerHarness::start(FIVE_LINES);

    harness.send(&set_breakpoint("src/TEST.EZ", 2));
    harness.recv();

    harness.send(&DebugCommand::Start);
    assert_eq!(harness.recv(), DebugEvent::Started);
    let location = expect_stopped(harness.recv());
    assert_eq!(location.line, 2);

    harness.send(&DebugCommand::Terminate);
    harness.recv();
    harness.join().unwrap();
}
