//! Interactive CLI core: grammar, rendering, and full session flows.

use super::*;

use ez_runtime::debugger::{parse_command, CliCommand, CliDebugger, SessionState};

const PROGRAM: &str = "\
let a = 1;
let b = a + 1;
print(b);
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

#[test]
fn test_launch_pauses_at_first_statement() {
    let mut debugger = CliDebugger::new("test.ez", PROGRAM);
    let lines = debugger.launch();
    assert!(lines.contains(&"started".to_string()));
    assert!(lines.contains(&"→ Paused at test.ez:1:1".to_string()));
    assert_eq!(debugger.state(), SessionState::Active);

    debugger.execute(CliCommand::Quit);
    assert_eq!(debugger.state(), SessionState::Terminated);
}

#[test]
fn test_step_print_and_vars_flow() {
    let mut debugger = CliDebugger::new("test.ez", PROGRAM);
    debugger.launch();

    // Step past line 1 so `a` exists.
    let lines = debugger.execute(CliCommand::StepOver);
    assert!(lines.contains(&"→ Paused at test.ez:2:1".to_string()));

    assert_eq!(
        debugger.execute(CliCommand::Print {
            name: "a".to_string()
        }),
        vec!["a = 1".to_string()]
    );
    assert_eq!(
        debugger.execute(CliCommand::Print {
            name: "missing".to_string()
        }),
        vec!["not found".to_string()]
    );

    let vars = debugger.execute(CliCommand::Vars);
    assert_eq!(vars, vec!["a = 1 (int)".to_string()]);

    debugger.execute(CliCommand::Quit);
}

#[test]
fn test_breakpoint_and_continue_flow() {
    let mut debugger = CliDebugger::new("test.ez", PROGRAM);
    debugger.launch();

    let lines = debugger.execute(CliCommand::Break {
        file: "test.ez".to_string(),
        line: 3,
    });
    assert_eq!(lines, vec!["breakpoint set at test.ez:3".to_string()]);

    let lines = debugger.execute(CliCommand::Continue);
    assert!(lines.contains(&"→ Paused at test.ez:3:1".to_string()));

    // Program output is rendered while waiting for the next stop.
    let lines = debugger.execute(CliCommand::Continue);
    assert_eq!(
        lines,
        vec!["2".to_string(), "program exited".to_string()]
    );
    assert_eq!(debugger.state(), SessionState::Exited);

    // Further control commands report the exit instead of hanging.
    assert_eq!(
        debugger.execute(CliCommand::StepInto),
        vec!["program exited".to_string()]
    );

    debugger.execute(CliCommand::Quit);
    assert_eq!(debugger.state(), SessionState::Terminated);
}

#[test]
fn test_stack_rendering_inside_call() {
    let mut debugger = CliDebugger::new("test.ez", CALL_PROGRAM);
    debugger.launch();
    debugger.execute(CliCommand::StepInto); // line 2
    debugger.execute(CliCommand::StepInto); // line 6, inside twice

    let lines = debugger.execute(CliCommand::Stack);
    assert_eq!(lines.len(), 1);
    let rendering = &lines[0];
    assert!(rendering.contains("#0 twice at test.ez:6:5"));
    assert!(rendering.contains("#1 <main> at test.ez:2:1"));

    debugger.execute(CliCommand::Quit);
}

#[test]
fn test_launch_with_syntax_error_terminates() {
    let mut debugger = CliDebugger::new("test.ez", "let = 1;");
    let lines = debugger.launch();
    assert!(lines[0].starts_with("error: "));
    assert_eq!(debugger.state(), SessionState::Terminated);
}

#[test]
fn test_grammar_accepts_full_verb_set() {
    let verbs = [
        ("step", CliCommand::StepInto),
        ("next", CliCommand::StepOver),
        ("out", CliCommand::StepOut),
        ("continue", CliCommand::Continue),
        ("breakpoints", CliCommand::Breakpoints),
        ("vars", CliCommand::Vars),
        ("stack", CliCommand::Stack),
        ("help", CliCommand::Help),
        ("quit", CliCommand::Quit),
    ];
    for (verb, expected) in verbs {
        assert_eq!(parse_command(verb).unwrap(), expected, "verb {verb}");
        assert_eq!(
            parse_command(&verb.to_uppercase()).unwrap(),
            expected,
            "verb {verb} uppercased"
        );
    }
}
