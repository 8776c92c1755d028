pub mod app_dirs;
pub mod encourage;
pub mod planet;
pub mod runtime;
pub mod snapshot;
pub mod store;
pub mod ui;
pub mod util;
pub mod voyage;

use crate::{
    app_dirs::AppDirs,
    encourage::{pick_message, SessionSummary, Toast},
    planet::Planet,
    runtime::{
        AppEvent, AppEventSource, CrosstermEventSource, FixedTicker, Runner, SessionTicker, Ticker,
    },
    snapshot::SessionRecord,
    store::{KvStore, MemStore, SqliteStore},
    util::group_thousands,
    voyage::{TimerPhase, Voyage},
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
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
    path::{Path, PathBuf},
    sync::mpsc::Sender,
    time::Duration,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 250;

/// cozy study-timer tui that logs focus minutes as a voyage across the solar system
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A cozy study timer that turns logged focus minutes into kilometers toward the Moon, Mars, or Saturn, with a live stopwatch, manual entry, and a persistent voyage history."
)]
pub struct Cli {
    /// destination to travel toward (overrides the saved selection)
    #[clap(short = 'd', long, value_enum)]
    destination: Option<Planet>,

    /// log a session of this many minutes without entering the tui
    #[clap(long)]
    log_minutes: Option<u64>,

    /// optional mood note attached to --log-minutes
    #[clap(long)]
    mood: Option<String>,

    /// write the retained session history as csv to this path and exit
    #[clap(long)]
    export_csv: Option<PathBuf>,

    /// override the on-disk store location (mainly for tests)
    #[clap(long)]
    store_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Mood,
    Manual,
}

#[derive(Debug)]
pub struct App {
    pub voyage: Voyage,
    pub mode: InputMode,
    /// Draft mood note, shared by the stopwatch and manual paths; cleared
    /// after every commit.
    pub mood: String,
    pub manual_minutes: String,
    pub toast: Option<Toast>,
    ticker: Option<SessionTicker>,
    tick_tx: Sender<AppEvent>,
}

impl App {
    pub fn new(voyage: Voyage, tick_tx: Sender<AppEvent>) -> Self {
        Self {
            voyage,
            mode: InputMode::Normal,
            mood: String::new(),
            manual_minutes: String::new(),
            toast: None,
            ticker: None,
            tick_tx,
        }
    }

    /// Base tick: retire an expired toast.
    pub fn on_tick(&mut self) {
        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }
    }

    pub fn on_timer_tick(&mut self) {
        self.voyage.on_timer_tick();
    }

    /// Dispatch a key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        match self.mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Manual => {
                self.handle_manual_key(key);
                false
            }
            InputMode::Mood => {
                self.handle_mood_key(key);
                false
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('s') => self.start_timer(),
            KeyCode::Char('p') => self.pause_timer(),
            KeyCode::Char('c') => self.complete_timer(),
            KeyCode::Char('l') => self.mode = InputMode::Manual,
            KeyCode::Char('m') => self.mode = InputMode::Mood,
            KeyCode::Left => {
                let prev = self.voyage.planet.prev();
                self.voyage.change_planet(prev);
            }
            KeyCode::Right => {
                let next = self.voyage.planet.next();
                self.voyage.change_planet(next);
            }
            KeyCode::Char('1') => self.voyage.change_planet(Planet::Moon),
            KeyCode::Char('2') => self.voyage.change_planet(Planet::Mars),
            KeyCode::Char('3') => self.voyage.change_planet(Planet::Saturn),
            _ => {}
        }
        false
    }

    fn handle_manual_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.manual_minutes.clear();
                self.mode = InputMode::Normal;
            }
            KeyCode::Enter => self.submit_manual(),
            KeyCode::Backspace => {
                self.manual_minutes.pop();
            }
            // Only digits can enter the field; everything else is ignored,
            // which is how invalid manual entry stays impossible to submit.
            KeyCode::Char(c) if c.is_ascii_digit() => self.manual_minutes.push(c),
            _ => {}
        }
    }

    fn handle_mood_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mood.clear();
                self.mode = InputMode::Normal;
            }
            KeyCode::Enter => self.mode = InputMode::Normal,
            KeyCode::Backspace => {
                self.mood.pop();
            }
            KeyCode::Char(c) => self.mood.push(c),
            _ => {}
        }
    }

    fn start_timer(&mut self) {
        if self.voyage.phase != TimerPhase::Running {
            self.voyage.start();
            self.ticker = Some(SessionTicker::spawn(self.tick_tx.clone()));
        }
    }

    fn pause_timer(&mut self) {
        if self.voyage.phase == TimerPhase::Running {
            self.voyage.pause();
            // Tear the ticker down on every exit from Running.
            self.ticker = None;
        }
    }

    fn complete_timer(&mut self) {
        if let Some(record) = self.voyage.complete_timer(&self.mood.clone()) {
            self.after_commit(record);
        }
    }

    fn submit_manual(&mut self) {
        let input = self.manual_minutes.clone();
        if let Some(record) = self.voyage.log_manual(&input, &self.mood.clone()) {
            self.manual_minutes.clear();
            self.mode = InputMode::Normal;
            self.after_commit(record);
        }
        // Invalid input never commits; the field stays open for correction.
    }

    fn after_commit(&mut self, record: SessionRecord) {
        // Every commit exits Running (voyage resets the stopwatch), so the
        // ticker is torn down with it.
        self.ticker = None;

        let summary = SessionSummary {
            minutes: record.minutes,
            km_traveled: record.km_traveled,
            mood: record.mood.clone(),
            percent: self.voyage.progress_percent(),
            planet: record.planet,
        };
        // A new toast supersedes any pending one, deadline included.
        self.toast = Some(Toast::new(pick_message(&summary)));
        self.mood.clear();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    let store = open_store(cli.store_path.as_deref());
    let mut voyage = Voyage::load(store);

    if let Some(destination) = cli.destination {
        voyage.change_planet(destination);
    }

    if let Some(minutes) = cli.log_minutes {
        let mood = cli.mood.clone().unwrap_or_default();
        match voyage.log_session(minutes, &mood) {
            Some(record) => {
                println!(
                    "logged {} minutes toward {} — {} km this session, {:.1}% of the voyage complete",
                    record.minutes,
                    voyage.planet.info().name,
                    group_thousands(record.km_traveled.round() as u64),
                    voyage.progress_percent(),
                );
            }
            None => {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::ValueValidation, "--log-minutes must be positive")
                    .exit();
            }
        }
        return Ok(());
    }

    if let Some(path) = cli.export_csv {
        export_sessions_csv(&voyage, &path)?;
        println!(
            "exported {} sessions to {}",
            voyage.sessions.len(),
            path.display()
        );
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new();
    let tick_tx = events.sender();
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));
    let mut app = App::new(voyage, tick_tx);

    let result = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::TimerTick => app.on_timer_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.handle_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

/// Open the on-disk store, degrading to an in-memory one (state lives for
/// the process only) if SQLite cannot open.
fn open_store(path_override: Option<&Path>) -> Box<dyn KvStore> {
    let opened = match path_override {
        Some(path) => SqliteStore::open(path),
        None => SqliteStore::open_default(),
    };

    match opened {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "could not open the on-disk store; running in-memory");
            Box::new(MemStore::new())
        }
    }
}

fn export_sessions_csv(voyage: &Voyage, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["id", "date", "planet", "minutes", "km", "mood"])?;
    for session in &voyage.sessions {
        writer.write_record([
            session.id.to_string(),
            session.date.clone(),
            session.planet.id(),
            session.minutes.to_string(),
            session.km_traveled.to_string(),
            session.mood.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Diagnostics go to a log file in the state dir; the TUI owns the
/// terminal, so stderr is not an option. Best-effort: a failure to set up
/// logging never blocks the app.
fn init_tracing() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .try_init();
}
