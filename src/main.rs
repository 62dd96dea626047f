use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};

use skiss::classifier::{ClassifierLink, NullLink, ProcessLink};
use skiss::config::{Config, ConfigStore, Difficulty, FileConfigStore};
use skiss::labels::LabelBook;
use skiss::runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner};
use skiss::App;

/// draw with the mouse, an external classifier guesses what it is
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal sketch-guessing game. Draw on a braille canvas with the mouse while an external classifier process watches over a line-based JSON protocol and calls out its guesses. Beat the shrinking clock, keep your lives, hit the win threshold."
)]
pub struct Cli {
    /// classifier worker command line, e.g. "python3 worker.py"
    #[clap(short = 'c', long)]
    classifier: Option<String>,

    /// pacing preset applied on top of the config file
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// starting lives
    #[clap(long)]
    lives: Option<i32>,

    /// countdown seconds before drawing starts
    #[clap(long)]
    countdown: Option<u32>,

    /// per-target sketch-time budget at session start, in ms
    #[clap(long)]
    budget_ms: Option<u64>,

    /// classification poll period in ms
    #[clap(long)]
    poll_ms: Option<u64>,

    /// logical canvas side length in pixels
    #[clap(long)]
    canvas_px: Option<u32>,
}

impl Cli {
    /// Flags override the preset, the preset overrides the config file
    fn apply(&self, cfg: &mut Config) {
        if let Some(d) = self.difficulty {
            cfg.apply_difficulty(d);
        }
        if let Some(lives) = self.lives {
            cfg.lives = lives;
        }
        if let Some(secs) = self.countdown {
            cfg.countdown_secs = secs;
        }
        if let Some(ms) = self.budget_ms {
            cfg.level_budget_ms = ms;
        }
        if let Some(ms) = self.poll_ms {
            cfg.poll_ms = ms.max(10);
        }
        if let Some(px) = self.canvas_px {
            cfg.canvas_px = px.max(64);
        }
        if self.classifier.is_some() {
            cfg.classifier_cmd = self.classifier.clone();
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut cfg = FileConfigStore::new().load();
    cli.apply(&mut cfg);

    let book = LabelBook::load()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, cfg, book);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    cfg: Config,
    book: LabelBook,
) -> Result<(), Box<dyn Error>> {
    let tick = Duration::from_millis(cfg.poll_ms.max(10));
    let events = CrosstermEventSource::with_tick(tick);

    let mut spawn_notice = None;
    let link: Box<dyn ClassifierLink> = match cfg.classifier_cmd.as_deref() {
        Some(cmd_line) => match ProcessLink::spawn(cmd_line, events.sender()) {
            Ok(link) => Box::new(link),
            Err(err) => {
                spawn_notice = Some(format!("could not start classifier: {err}"));
                Box::new(NullLink)
            }
        },
        None => Box::new(NullLink),
    };

    let runner = Runner::new(events, FixedTicker::new(tick));
    let mut app = App::new(cfg, book, link);
    app.notice = spawn_notice;

    let size = terminal.size()?;
    app.handle_event(GameEvent::Resize(size.width, size.height));

    loop {
        terminal.draw(|f| ui(&app, f))?;
        app.handle_event(runner.step());
        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_leave_config_untouched() {
        let cli = Cli::try_parse_from(["skiss"]).unwrap();
        let mut cfg = Config::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn cli_flag_overrides_the_preset() {
        let cli = Cli::try_parse_from(["skiss", "-d", "frantic", "--lives", "9"]).unwrap();
        let mut cfg = Config::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.level_budget_ms, 9_000);
        assert_eq!(cfg.lives, 9);
    }

    #[test]
    fn cli_relaxed_preset_applies() {
        let cli = Cli::try_parse_from(["skiss", "--difficulty", "relaxed"]).unwrap();
        let mut cfg = Config::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.lives, 5);
        assert_eq!(cfg.level_budget_ms, 20_000);
    }

    #[test]
    fn cli_takes_a_classifier_command() {
        let cli = Cli::try_parse_from(["skiss", "--classifier", "python3 worker.py"]).unwrap();
        let mut cfg = Config::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.classifier_cmd.as_deref(), Some("python3 worker.py"));
    }

    #[test]
    fn cli_rejects_unknown_presets() {
        assert!(Cli::try_parse_from(["skiss", "-d", "impossible"]).is_err());
    }

    #[test]
    fn cli_clamps_degenerate_values() {
        let cli = Cli::try_parse_from(["skiss", "--poll-ms", "1", "--canvas-px", "8"]).unwrap();
        let mut cfg = Config::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.poll_ms, 10);
        assert_eq!(cfg.canvas_px, 64);
    }

    #[test]
    fn cli_budget_and_countdown_flags() {
        let cli =
            Cli::try_parse_from(["skiss", "--budget-ms", "30000", "--countdown", "5"]).unwrap();
        let mut cfg = Config::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.level_budget_ms, 30_000);
        assert_eq!(cfg.countdown_secs, 5);
    }
}
