//! JSON debug server - line-delimited JSON over a byte stream.
//!
//! One JSON object per `\n`-terminated line, both directions. A reader
//! thread pulls command lines from the input; engine events and command
//! lines are merged onto one bounded channel so the main loop is the single
//! writer on the output stream. Output is flushed after every event.
//!
//! Malformed lines produce an `error` event and the session continues.
//! End of input terminates the session cleanly.

use std::io::{BufRead, BufReader, Read, Write};
use std::sync::mpsc::{sync_channel, SyncSender};
use std::thread;

use crate::debugger::controller::Controller;
use crate::debugger::engine::DebugSession;
use crate::debugger::protocol::{decode_command, encode_event, DebugCommand, DebugEvent};

/// Capacity of the merged command/event channel.
const CHANNEL_CAPACITY: usize = 64;

/// Messages merged onto the server's single processing loop.
enum ServerMsg {
    /// One line read from the transport.
    Line(String),
    /// An event emitted by the engine or evaluator.
    Event(DebugEvent),
    /// The transport reached end of input or failed.
    InputClosed,
}

/// Run a debug session speaking the JSON protocol over `input`/`output`.
///
/// Blocks until the session terminates. Returns an error only when writing
/// to `output` fails, which callers treat as a protocol-fatal condition.
pub fn serve<R, W>(file: &str, source: &str, input: R, mut output: W) -> std::io::Result<()>
where
    R: Read + Send + 'static,
    W: Write,
{
    let (session, events) = DebugSession::new();
    let mut controller = Controller::new(session, file, source);

    let (msg_tx, msg_rx) = sync_channel::<ServerMsg>(CHANNEL_CAPACITY);

    // Engine events → merged channel.
    let event_tx = msg_tx.clone();
    thread::Builder::new()
        .name("ez-debug-events".to_string())
        .spawn(move || {
            for event in events {
                if event_tx.send(ServerMsg::Event(event)).is_err() {
                    break;
                }
            }
        })
        .expect("failed to spawn event pump thread");

    // Transport lines → merged channel.
    spawn_reader(input, msg_tx.clone());
    drop(msg_tx);

    for msg in msg_rx {
        match msg {
            ServerMsg::Line(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match decode_command(&line) {
                    Ok(command) => {
                        let is_terminate = command == DebugCommand::Terminate;
                        for event in controller.dispatch(command) {
                            write_event(&mut output, &event)?;
                        }
                        if is_terminate {
                            break;
                        }
                    }
                    Err(error) => write_event(&mut output, &error.to_event())?,
                }
            }
            ServerMsg::Event(event) => {
                let is_terminated = matches!(event, DebugEvent::Terminated { .. });
                write_event(&mut output, &event)?;
                if is_terminated {
                    break;
                }
            }
            ServerMsg::InputClosed => {
                controller.session().terminate();
                break;
            }
        }
    }

    Ok(())
}

fn spawn_reader<R: Read + Send + 'static>(input: R, tx: SyncSender<ServerMsg>) {
    thread::Builder::new()
        .name("ez-debug-reader".to_string())
        .spawn(move || {
            let reader = BufReader::new(input);
            for line in reader.lines() {
                let msg = match line {
                    Ok(line) => ServerMsg::Line(line),
                    Err(_) => break,
                };
                if tx.send(msg).is_err() {
                    return;
                }
            }
            let _ = tx.send(ServerMsg::InputClosed);
        })
        .expect("failed to spawn reader thread");
}

fn write_event<W: Write>(output: &mut W, event: &DebugEvent) -> std::io::Result<()> {
    let line = encode_event(event).map_err(std::io::Error::other)?;
    writeln!(output, "{line}")?;
    output.flush()
}
