use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use webbrowser::Browser;

use crate::celebration::Celebration;
use crate::classifier::{ClassifierLink, WorkerStatus};
use crate::config::Config;
use crate::game::{GamePhase, GameSession};
use crate::gate::ClassifyGate;
use crate::labels::LabelBook;
use crate::runtime::GameEvent;
use crate::sketch::{PointerMap, SketchPad};

/// Top-level application state: the session plus every peripheral the
/// session talks through. One `handle_event` call per runtime event;
/// rendering reads the fields afterwards.
pub struct App {
    pub session: GameSession,
    pub pad: SketchPad,
    pub gate: ClassifyGate,
    pub celebration: Celebration,
    /// One-line banner for degraded states (worker gone, nothing attached)
    pub notice: Option<String>,
    pub should_quit: bool,
    link: Box<dyn ClassifierLink>,
    pointer: PointerMap,
    tick_ms: u64,
    cols: u16,
    rows: u16,
    celebrated: bool,
}

impl App {
    pub fn new(cfg: Config, book: LabelBook, link: Box<dyn ClassifierLink>) -> Self {
        let pad = SketchPad::new(&cfg);
        let pointer = PointerMap::new(80, 24, cfg.canvas_px);
        let tick_ms = cfg.poll_ms;
        Self {
            session: GameSession::new(cfg, book),
            pad,
            gate: ClassifyGate::new(),
            celebration: Celebration::new(),
            notice: None,
            should_quit: false,
            link,
            pointer,
            tick_ms,
            cols: 80,
            rows: 24,
            celebrated: false,
        }
    }

    pub fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Tick => self.on_tick(),
            GameEvent::Key(key) => self.on_key(key),
            GameEvent::Mouse(mouse) => self.on_mouse(mouse),
            GameEvent::Resize(cols, rows) => {
                self.cols = cols;
                self.rows = rows;
                self.pointer.resize(cols, rows);
            }
            GameEvent::Worker(status) => self.on_worker(status),
            GameEvent::WorkerClosed => {
                self.gate.mark_unavailable();
                self.gate.settle();
                if self.session.phase() == GamePhase::Loading {
                    self.session.exit_to_menu(&mut self.pad, &mut self.gate);
                }
                self.notice = Some("classifier worker exited, guessing is off".to_string());
            }
        }
    }

    fn on_tick(&mut self) {
        self.session
            .on_tick(self.tick_ms, &mut self.pad, &mut self.gate);
        if self.session.phase() == GamePhase::Playing
            && self
                .gate
                .poll(self.session.generation(), &self.pad, self.link.as_ref())
                .is_err()
        {
            self.gate.mark_unavailable();
            self.notice = Some("classifier worker unreachable".to_string());
        }
        self.maybe_celebrate();
        self.celebration.update(self.tick_ms as f64 / 1000.0);
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.session.phase() {
            GamePhase::Menu => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.start_requested(),
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
            GamePhase::Loading => match key.code {
                KeyCode::Esc => self.session.exit_to_menu(&mut self.pad, &mut self.gate),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
            GamePhase::Countdown => {}
            GamePhase::Playing => match key.code {
                KeyCode::Esc => self.session.exit_to_menu(&mut self.pad, &mut self.gate),
                KeyCode::Char('c') => {
                    self.pad.clear(false);
                    self.gate.note_sketch_cleared();
                }
                KeyCode::Char('s') => {
                    self.session.skip(&mut self.pad, &mut self.gate);
                    self.maybe_celebrate();
                }
                _ => {}
            },
            GamePhase::End => match key.code {
                KeyCode::Char('p') | KeyCode::Enter => {
                    self.reset_celebration();
                    self.session.play_again(&mut rand::thread_rng());
                }
                KeyCode::Char('m') | KeyCode::Esc => {
                    self.reset_celebration();
                    self.session.return_to_menu();
                }
                KeyCode::Char('t') => self.share_score(),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if self.session.phase() != GamePhase::Playing {
            return;
        }
        let changed = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let (x, y) = self.pointer.to_canvas(mouse.column, mouse.row);
                self.pad.pen_down(x, y)
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let (x, y) = self.pointer.to_canvas(mouse.column, mouse.row);
                self.pad.pen_move(x, y)
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.pad.pen_up();
                false
            }
            _ => false,
        };
        if changed {
            self.session
                .note_sketch_changed(&mut self.pad, &mut self.gate);
            // Running out of budget here can end a winning session
            self.maybe_celebrate();
        }
    }

    fn on_worker(&mut self, status: WorkerStatus) {
        match status {
            WorkerStatus::Ready => {
                self.gate.mark_ready();
                self.notice = None;
                self.session.on_worker_ready(&mut rand::thread_rng());
            }
            WorkerStatus::Update => {}
            WorkerStatus::Result { data } => {
                if let Some(token) = self.gate.settle() {
                    self.session
                        .ingest_result(token, data, &mut self.pad, &mut self.gate);
                    self.maybe_celebrate();
                }
            }
        }
    }

    fn start_requested(&mut self) {
        if !self.link.is_attached() {
            self.notice =
                Some("no classifier attached, start with --classifier <cmd>".to_string());
            return;
        }
        let ready = self.gate.is_ready();
        if self
            .session
            .request_start(ready, self.link.as_ref(), &mut rand::thread_rng())
            .is_err()
        {
            self.session.exit_to_menu(&mut self.pad, &mut self.gate);
            self.gate.mark_unavailable();
            self.notice = Some("classifier worker unreachable".to_string());
        }
    }

    fn maybe_celebrate(&mut self) {
        if self.session.phase() == GamePhase::End && self.session.is_won() && !self.celebrated {
            self.celebrated = true;
            self.celebration.start(self.cols, self.rows);
        }
    }

    fn reset_celebration(&mut self) {
        self.celebrated = false;
        self.celebration = Celebration::new();
    }

    fn share_score(&self) {
        if Browser::is_available() {
            webbrowser::open(&format!(
                "https://twitter.com/intent/tweet?text=skiss%3A%20guessed%20{}%20of%20{}%20sketches%2C%20{}",
                self.session.correct_count(),
                self.session.resolved_count(),
                if self.session.is_won() { "won" } else { "lost" },
            ))
            .unwrap_or_default();
        }
    }
}
