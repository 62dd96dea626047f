use chrono::Local;
use rand::Rng;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::classifier::{Candidate, ClassifierLink, WorkerCommand};
use crate::config::Config;
use crate::gate::ClassifyGate;
use crate::labels::LabelBook;
use crate::shaper;
use crate::sketch::{SketchImage, SketchPad};

/// How long the "correct" flash stays on screen, in ms
const CORRECT_PULSE_MS: u64 = 600;

/// The five session phases. Input routing and rendering both key off
/// this; no subsystem keeps a shadow copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Menu,
    Loading,
    Countdown,
    Playing,
    End,
}

/// Immutable record of one resolved target, kept for the end-of-game
/// review. Snapshots are taken before the pad is cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub target: String,
    /// Top shaped candidate at resolution time, if any output had arrived
    pub output: Option<Candidate>,
    pub snapshot: Option<SketchImage>,
    pub correct: bool,
}

/// One game session. All round state lives here and is mutated only
/// through the transition methods below; callers read it back through
/// the accessors.
#[derive(Debug)]
pub struct GameSession {
    cfg: Config,
    book: LabelBook,
    phase: GamePhase,
    lives: i32,
    countdown: i32,
    countdown_acc_ms: u64,
    targets: Vec<String>,
    target_index: usize,
    responses: Vec<String>,
    budget_ms: u64,
    predictions: Vec<Prediction>,
    /// Bumped on every target change and pad reset; results submitted
    /// under an older value are dropped as stale
    generation: u64,
    last_output: Vec<Candidate>,
    elapsed_ms: u64,
    pulse_ms: u64,
    journal_path: Option<PathBuf>,
}

impl GameSession {
    pub fn new(cfg: Config, book: LabelBook) -> Self {
        let lives = cfg.lives;
        let countdown = cfg.countdown_secs as i32;
        let budget_ms = cfg.level_budget_ms;
        Self {
            cfg,
            book,
            phase: GamePhase::Menu,
            lives,
            countdown,
            countdown_acc_ms: 0,
            targets: Vec::new(),
            target_index: 0,
            responses: Vec::new(),
            budget_ms,
            predictions: Vec::new(),
            generation: 0,
            last_output: Vec::new(),
            elapsed_ms: 0,
            pulse_ms: 0,
            journal_path: AppDirs::scores_path(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn countdown(&self) -> i32 {
        self.countdown
    }

    pub fn budget_ms(&self) -> u64 {
        self.budget_ms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn latest_output(&self) -> &[Candidate] {
        &self.last_output
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    /// True while the short post-correct flash should render
    pub fn pulse_active(&self) -> bool {
        self.pulse_ms > 0
    }

    pub fn current_target(&self) -> Option<&str> {
        self.targets.get(self.target_index).map(String::as_str)
    }

    /// Guess-phrase shown next to the classifier output, rotated per target
    pub fn current_response(&self) -> Option<&str> {
        if self.responses.is_empty() {
            return None;
        }
        let idx = self.target_index % self.responses.len();
        self.responses.get(idx).map(String::as_str)
    }

    pub fn correct_count(&self) -> usize {
        self.predictions.iter().filter(|p| p.correct).count()
    }

    pub fn resolved_count(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_won(&self) -> bool {
        self.correct_count() >= self.cfg.win_threshold
    }

    /// Where the score journal is appended on a natural end. `None`
    /// disables journaling; tests point this at a temp file.
    pub fn set_journal_path(&mut self, path: Option<PathBuf>) {
        self.journal_path = path;
    }

    /// Start requested from the menu. With the worker already ready the
    /// countdown begins at once; otherwise a `load` goes out and the
    /// session waits in `loading` for the ready signal.
    pub fn request_start<R: Rng>(
        &mut self,
        worker_ready: bool,
        link: &dyn ClassifierLink,
        rng: &mut R,
    ) -> crate::error::SkResult<()> {
        if self.phase != GamePhase::Menu {
            return Ok(());
        }
        if worker_ready {
            self.begin_countdown(rng);
        } else {
            self.phase = GamePhase::Loading;
            link.send(WorkerCommand::Load)?;
        }
        Ok(())
    }

    /// Ready signal from the worker; a pending start proceeds, anything
    /// else ignores it
    pub fn on_worker_ready<R: Rng>(&mut self, rng: &mut R) {
        if self.phase == GamePhase::Loading {
            self.begin_countdown(rng);
        }
    }

    pub fn play_again<R: Rng>(&mut self, rng: &mut R) {
        if self.phase == GamePhase::End {
            self.begin_countdown(rng);
        }
    }

    /// Leave the end screen, dropping the reviewed predictions
    pub fn return_to_menu(&mut self) {
        if self.phase == GamePhase::End {
            self.predictions.clear();
            self.last_output.clear();
            self.phase = GamePhase::Menu;
        }
    }

    /// Explicit exit during play or while waiting on the worker. The
    /// round is discarded without a journal entry.
    pub fn exit_to_menu(&mut self, pad: &mut SketchPad, gate: &mut ClassifyGate) {
        if !matches!(self.phase, GamePhase::Playing | GamePhase::Loading) {
            return;
        }
        self.reset_round_clocks(pad, gate);
        self.predictions.clear();
        self.phase = GamePhase::Menu;
    }

    fn begin_countdown<R: Rng>(&mut self, rng: &mut R) {
        self.lives = self.cfg.lives;
        self.countdown = self.cfg.countdown_secs as i32;
        self.countdown_acc_ms = 0;
        self.budget_ms = self.cfg.level_budget_ms;
        self.targets = self.book.target_pool(&self.cfg.banned_labels, rng);
        self.responses = self.book.response_pool(rng);
        self.target_index = 0;
        self.last_output.clear();
        self.phase = GamePhase::Countdown;
    }

    fn start_playing(&mut self, pad: &mut SketchPad, gate: &mut ClassifyGate) {
        self.predictions.clear();
        self.elapsed_ms = 0;
        self.generation += 1;
        pad.clear(true);
        gate.note_sketch_cleared();
        self.phase = GamePhase::Playing;
    }

    /// Advance the phase clocks by one tick. The countdown derives its
    /// 1 Hz decrement from accumulated tick time so the tick rate can be
    /// anything without changing the pace.
    pub fn on_tick(&mut self, dt_ms: u64, pad: &mut SketchPad, gate: &mut ClassifyGate) {
        self.pulse_ms = self.pulse_ms.saturating_sub(dt_ms);
        match self.phase {
            GamePhase::Countdown => {
                self.countdown_acc_ms += dt_ms;
                while self.countdown_acc_ms >= 1000 && self.phase == GamePhase::Countdown {
                    self.countdown_acc_ms -= 1000;
                    self.countdown -= 1;
                    if self.countdown <= 0 {
                        self.start_playing(pad, gate);
                    }
                }
            }
            GamePhase::Playing => {
                self.elapsed_ms += dt_ms;
            }
            _ => {}
        }
    }

    /// Run after every processed pointer move. Marks the gate dirty and
    /// applies the budget check; overrunning the budget costs the target.
    pub fn note_sketch_changed(&mut self, pad: &mut SketchPad, gate: &mut ClassifyGate) {
        if self.phase != GamePhase::Playing {
            return;
        }
        gate.note_sketch_changed();
        if pad.time_spent_ms() > self.budget_ms {
            self.resolve_miss(pad, gate);
        }
    }

    /// Give up on the current target. Deliberately identical to running
    /// out of budget.
    pub fn skip(&mut self, pad: &mut SketchPad, gate: &mut ClassifyGate) {
        self.resolve_miss(pad, gate);
    }

    /// Consume one worker result. `token` is the generation the request
    /// was submitted under; stale or out-of-phase results are dropped.
    pub fn ingest_result(
        &mut self,
        token: u64,
        mut raw: Vec<Candidate>,
        pad: &mut SketchPad,
        gate: &mut ClassifyGate,
    ) {
        if self.phase != GamePhase::Playing || token != self.generation {
            return;
        }
        let Some(target) = self.current_target().map(str::to_string) else {
            return;
        };
        shaper::shape(&mut raw, pad.time_spent_ms(), &target, &self.cfg);
        self.last_output = raw;
        let top_is_target = self
            .last_output
            .first()
            .map(|c| c.label == target)
            .unwrap_or(false);
        if top_is_target {
            self.resolve_correct(pad, gate);
        }
    }

    fn resolve_correct(&mut self, pad: &mut SketchPad, gate: &mut ClassifyGate) {
        self.push_prediction(true, pad);
        self.budget_ms = self
            .budget_ms
            .saturating_sub(self.cfg.budget_step_ms)
            .max(self.cfg.budget_floor_ms);
        self.pulse_ms = CORRECT_PULSE_MS;
        self.advance_target(pad, gate);
    }

    fn resolve_miss(&mut self, pad: &mut SketchPad, gate: &mut ClassifyGate) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.lives -= 1;
        // The life-ending miss is not reviewable; the session is over.
        if self.lives > 0 {
            self.push_prediction(false, pad);
        }
        self.advance_target(pad, gate);
        if self.lives <= 0 {
            self.finish(pad, gate);
        }
    }

    fn push_prediction(&mut self, correct: bool, pad: &SketchPad) {
        let Some(target) = self.current_target() else {
            return;
        };
        self.predictions.push(Prediction {
            target: target.to_string(),
            output: self.last_output.first().cloned(),
            snapshot: pad.cropped_image(),
            correct,
        });
    }

    fn advance_target(&mut self, pad: &mut SketchPad, gate: &mut ClassifyGate) {
        self.target_index += 1;
        self.generation += 1;
        self.last_output.clear();
        pad.clear(true);
        gate.note_sketch_cleared();
        if self.phase == GamePhase::Playing && self.current_target().is_none() {
            self.finish(pad, gate);
        }
    }

    /// Natural end of a session: predictions stay for review and one
    /// journal row is appended. Journal errors are swallowed; losing a
    /// score line never takes the game down.
    fn finish(&mut self, pad: &mut SketchPad, gate: &mut ClassifyGate) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.reset_round_clocks(pad, gate);
        self.phase = GamePhase::End;
        if let Some(path) = self.journal_path.clone() {
            let _ = self.write_results(&path);
        }
    }

    fn reset_round_clocks(&mut self, pad: &mut SketchPad, gate: &mut ClassifyGate) {
        self.generation += 1;
        self.last_output.clear();
        self.countdown = self.cfg.countdown_secs as i32;
        self.countdown_acc_ms = 0;
        self.pulse_ms = 0;
        pad.clear(true);
        gate.note_sketch_cleared();
    }

    fn write_results(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let needs_header = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer
                .write_record(["date", "correct", "resolved", "lives_left", "elapsed_secs", "won"])
                .map_err(io::Error::other)?;
        }
        writer
            .write_record([
                Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                self.correct_count().to_string(),
                self.resolved_count().to_string(),
                self.lives.max(0).to_string(),
                (self.elapsed_ms / 1000).to_string(),
                self.is_won().to_string(),
            ])
            .map_err(io::Error::other)?;
        writer.flush()
    }
}
