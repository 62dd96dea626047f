#![cfg(unix)]

use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use assert_matches::assert_matches;
use skiss::classifier::{ClassifierLink, ProcessLink, WorkerCommand, WorkerStatus};
use skiss::runtime::GameEvent;
use skiss::sketch::SketchImage;

// End-to-end over the real process boundary: a shell script stands in for
// the classifier worker and speaks the line-oriented JSON protocol.

const STUB_WORKER: &str = r#"#!/bin/sh
echo "booting stub classifier"
while read -r line; do
  case "$line" in
    *'"action":"load"'*)
      echo '{"status":"update"}'
      echo '{"status":"ready"}'
      ;;
    *'"action":"classify"'*)
      echo '{"status":"update"}'
      echo '{"status":"result","data":[{"label":"cat","score":0.9},{"label":"dog","score":0.1}]}'
      ;;
  esac
done
"#;

fn spawn_stub() -> (ProcessLink, Receiver<GameEvent>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("worker.sh");
    std::fs::write(&script, STUB_WORKER).unwrap();
    let (tx, rx) = channel();
    let link = ProcessLink::spawn(&format!("/bin/sh {}", script.display()), tx).unwrap();
    (link, rx, dir)
}

fn next_event(rx: &Receiver<GameEvent>) -> GameEvent {
    rx.recv_timeout(Duration::from_secs(5))
        .expect("worker fell silent")
}

#[test]
fn stub_worker_speaks_the_protocol() {
    let (link, rx, _dir) = spawn_stub();

    link.send(WorkerCommand::Load).unwrap();
    // the boot chatter line must not surface as an event
    assert_matches!(next_event(&rx), GameEvent::Worker(WorkerStatus::Update));
    assert_matches!(next_event(&rx), GameEvent::Worker(WorkerStatus::Ready));

    link.send(WorkerCommand::Classify {
        image: SketchImage {
            width: 2,
            height: 2,
            pixels: vec![0, 255, 255, 0],
        },
    })
    .unwrap();
    assert_matches!(next_event(&rx), GameEvent::Worker(WorkerStatus::Update));
    match next_event(&rx) {
        GameEvent::Worker(WorkerStatus::Result { data }) => {
            assert_eq!(data.len(), 2);
            assert_eq!(data[0].label, "cat");
            assert_eq!(data[0].score, 0.9);
        }
        other => panic!("expected a result, got {other:?}"),
    }
}

#[test]
fn dropping_the_link_surfaces_worker_closed() {
    let (link, rx, _dir) = spawn_stub();

    link.send(WorkerCommand::Load).unwrap();
    assert_matches!(next_event(&rx), GameEvent::Worker(_));
    assert_matches!(next_event(&rx), GameEvent::Worker(_));

    // dropping the link closes the worker's stdin; the script exits on EOF
    drop(link);
    loop {
        match next_event(&rx) {
            GameEvent::WorkerClosed => break,
            GameEvent::Worker(_) => continue,
            other => panic!("unexpected event {other:?}"),
        }
    }
}

#[test]
fn missing_worker_binary_fails_to_spawn() {
    let (tx, _rx) = channel();
    let err = ProcessLink::spawn("/definitely/not/a/worker", tx);
    assert!(err.is_err());
}
