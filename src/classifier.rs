use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::process::{ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::{SkResult, SkissError};
use crate::runtime::GameEvent;
use crate::sketch::SketchImage;

/// One ranked guess from the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub score: f64,
}

/// Messages sent to the worker, one JSON object per line on its stdin
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum WorkerCommand {
    Load,
    Classify { image: SketchImage },
}

/// Messages read from the worker's stdout. Anything that does not parse is
/// treated as worker chatter and skipped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerStatus {
    Ready,
    Update,
    Result { data: Vec<Candidate> },
}

/// Outbound half of the worker channel. Inbound messages always arrive as
/// `GameEvent::Worker` on the runtime channel, so links stay fire-and-forget.
pub trait ClassifierLink {
    fn send(&self, cmd: WorkerCommand) -> SkResult<()>;

    /// Whether a worker is attached at all; the menu warns when not
    fn is_attached(&self) -> bool {
        true
    }
}

/// Spawned external worker process. Commands go through a writer thread so
/// the interactive thread never blocks on a slow worker stdin.
pub struct ProcessLink {
    tx: Sender<WorkerCommand>,
}

impl ProcessLink {
    /// Spawn `cmd_line` (whitespace-split, no shell interpretation) with
    /// piped stdio and forward its stdout messages onto the runtime channel.
    /// Worker exit surfaces as a `WorkerClosed` event.
    pub fn spawn(cmd_line: &str, events: Sender<GameEvent>) -> SkResult<Self> {
        let mut parts = cmd_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| SkissError::Worker("empty classifier command".to_string()))?
            .to_string();
        let mut child = Command::new(&program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SkissError::Worker(format!("failed to spawn {program}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SkissError::Worker("worker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SkissError::Worker("worker stdout unavailable".to_string()))?;

        let (tx, rx) = channel::<WorkerCommand>();
        thread::spawn(move || write_commands(stdin, rx));
        thread::spawn(move || {
            read_statuses(stdout, &events);
            let _ = events.send(GameEvent::WorkerClosed);
            let _ = child.wait();
        });
        Ok(Self { tx })
    }
}

impl ClassifierLink for ProcessLink {
    fn send(&self, cmd: WorkerCommand) -> SkResult<()> {
        self.tx
            .send(cmd)
            .map_err(|_| SkissError::Worker("worker channel closed".to_string()))
    }
}

fn write_commands(mut stdin: ChildStdin, rx: Receiver<WorkerCommand>) {
    for cmd in rx {
        let line = match serde_json::to_string(&cmd) {
            Ok(line) => line,
            Err(_) => continue,
        };
        if writeln!(stdin, "{line}").is_err() {
            break;
        }
    }
}

fn read_statuses(stdout: ChildStdout, events: &Sender<GameEvent>) {
    let reader = BufReader::new(stdout);
    for line in reader.lines() {
        let Ok(line) = line else { break };
        if let Ok(status) = serde_json::from_str::<WorkerStatus>(&line) {
            if events.send(GameEvent::Worker(status)).is_err() {
                break;
            }
        }
    }
}

/// Stand-in when no worker is configured; accepts and drops every command
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLink;

impl ClassifierLink for NullLink {
    fn send(&self, _cmd: WorkerCommand) -> SkResult<()> {
        Ok(())
    }

    fn is_attached(&self) -> bool {
        false
    }
}

/// Records outbound commands so tests can assert on gate behavior
#[derive(Debug, Clone, Default)]
pub struct RecordingLink {
    sent: Arc<Mutex<Vec<WorkerCommand>>>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<WorkerCommand> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl ClassifierLink for RecordingLink {
    fn send(&self, cmd: WorkerCommand) -> SkResult<()> {
        self.sent.lock().unwrap().push(cmd);
        Ok(())
    }
}
