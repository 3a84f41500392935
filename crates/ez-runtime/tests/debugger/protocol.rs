//! Wire-format checks: envelope shape and authoritative event spellings.

use super::*;

use ez_runtime::debugger::{
    decode_command, encode_event, Breakpoint, ErrorCode, PauseReason, StackFrame, Variable,
};

fn wire_value(event: &DebugEvent) -> serde_json::Value {
    let line = encode_event(event).unwrap();
    serde_json::from_str(&line).unwrap()
}

#[test]
fn test_every_event_carries_the_event_envelope() {
    let events = vec![
        (DebugEvent::Initialized, "initialized"),
        (DebugEvent::Started, "started"),
        (
            DebugEvent::Stopped {
                location: loc(3),
                reason: PauseReason::Breakpoint,
            },
            "stopped",
        ),
        (
            DebugEvent::Output {
                text: "hi".to_string(),
            },
            "output",
        ),
        (DebugEvent::Exited, "exited"),
        (DebugEvent::Terminated { reason: None }, "terminated"),
        (
            DebugEvent::BreakpointSet {
                file: "test.ez".to_string(),
                line: 3,
            },
            "breakpointSet",
        ),
        (
            DebugEvent::BreakpointCleared {
                file: "test.ez".to_string(),
                line: 3,
            },
            "breakpointCleared",
        ),
        (
            DebugEvent::Breakpoints {
                breakpoints: vec![Breakpoint::new("test.ez", 3)],
            },
            "breakpoints",
        ),
        (
            DebugEvent::Variables {
                variables: vec![Variable::new("x", "10", "int")],
                stale: false,
            },
            "variables",
        ),
        (
            DebugEvent::StackTrace {
                frames: vec![StackFrame {
                    index: 0,
                    function_name: "<main>".to_string(),
                    file: "test.ez".to_string(),
                    line: 1,
                    column: 1,
                }],
                stale: false,
            },
            "stackTrace",
        ),
        (
            DebugEvent::Error {
                code: ErrorCode::BadRequest,
                message: "nope".to_string(),
            },
            "error",
        ),
    ];

    for (event, name) in events {
        let value = wire_value(&event);
        assert_eq!(value["type"], "event", "bad envelope for {name}");
        assert_eq!(value["event"], name, "bad event name for {name}");
    }
}

#[test]
fn test_stopped_data_shape() {
    let value = wire_value(&DebugEvent::Stopped {
        location: SourceLocation::new("test.ez", 3, 7),
        reason: PauseReason::Step,
    });
    let location = &value["data"]["location"];
    assert_eq!(location["file"], "test.ez");
    assert_eq!(location["line"], 3);
    assert_eq!(location["column"], 7);
}

#[test]
fn test_variables_data_shape() {
    let value = wire_value(&DebugEvent::Variables {
        variables: vec![Variable::new("x", "10", "int")],
        stale: false,
    });
    let entry = &value["data"]["variables"][0];
    assert_eq!(entry["name"], "x");
    assert_eq!(entry["value"], "10");
    assert_eq!(entry["type"], "int");
}

#[test]
fn test_stack_trace_data_shape() {
    let value = wire_value(&DebugEvent::StackTrace {
        frames: vec![StackFrame {
            index: 0,
            function_name: "twice".to_string(),
            file: "test.ez".to_string(),
            line: 6,
            column: 5,
        }],
        stale: false,
    });
    let frame = &value["data"]["frames"][0];
    assert_eq!(frame["index"], 0);
    assert_eq!(frame["functionName"], "twice");
    assert_eq!(frame["file"], "test.ez");
    assert_eq!(frame["line"], 6);
    assert_eq!(frame["column"], 5);
}

#[test]
fn test_error_data_shape() {
    let value = wire_value(&DebugEvent::Error {
        code: ErrorCode::BadRequest,
        message: "unknown verb".to_string(),
    });
    assert_eq!(value["data"]["code"], "BadRequest");
    assert_eq!(value["data"]["message"], "unknown verb");
}

#[test]
fn test_command_spellings_decode() {
    let cases = vec![
        (r#"{"type":"command","command":"initialize","params":{"file":"test.ez"}}"#, true),
        (r#"{"type":"command","command":"start"}"#, true),
        (r#"{"type":"command","command":"stepInto"}"#, true),
        (r#"{"type":"command","command":"stepOver"}"#, true),
        (r#"{"type":"command","command":"stepOut"}"#, true),
        (r#"{"type":"command","command":"continue"}"#, true),
        (r#"{"type":"command","command":"setBreakpoint","params":{"file":"test.ez","line":3}}"#, true),
        (r#"{"type":"command","command":"clearBreakpoint","params":{"file":"test.ez","line":3}}"#, true),
        (r#"{"type":"command","command":"listBreakpoints"}"#, true),
        (r#"{"type":"command","command":"getVariables","params":{"frameIndex":0}}"#, true),
        (r#"{"type":"command","command":"getStackTrace"}"#, true),
        (r#"{"type":"command","command":"terminate"}"#, true),
        (r#"{"type":"command","command":"evaluate"}"#, false),
        (r#"{"type":"event","event":"started"}"#, false),
    ];
    for (line, ok) in cases {
        assert_eq!(decode_command(line).is_ok(), ok, "unexpected result for {line}");
    }
}

#[test]
fn test_reserved_condition_field_survives_round_trip() {
    let mut bp = Breakpoint::new("test.ez", 3);
    bp.condition = Some("x > 10".to_string());
    let json = serde_json::to_string(&bp).unwrap();
    let back: Breakpoint = serde_json::from_str(&json).unwrap();
    assert_eq!(back.condition.as_deref(), Some("x > 10"));
}
