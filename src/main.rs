use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use lyrik::{
    app_dirs::AppDirs,
    audio::FileSoundtrack,
    config::{Config, ConfigStore, FileConfigStore, SpeedMode},
    driver::{Playthrough, PlaythroughReport},
    level::{self, Level},
    logging,
    menu::{self, MenuAction, MenuState},
    runtime::{CrosstermEventSource, EventSource, GameEvent},
    terminal::TerminalIo,
    theme::Theme,
    ui::{GameOverView, MenuView},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::mpsc::RecvTimeoutError,
    thread,
    time::Duration,
};

const GAME_OVER_SECS: u64 = 3;
const MENU_POLL_MS: u64 = 250;

/// type the lyrics before the music moves on
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A rhythm typing game: each lyric line appears on its cue and must be typed before the next one arrives."
)]
pub struct Cli {
    /// directory holding <name>.lrc and <name>.mp3 pairs
    #[clap(short = 'd', long)]
    levels_dir: Option<PathBuf>,

    /// start this level directly, skipping the menu
    #[clap(short = 'l', long)]
    level: Option<String>,

    /// playback speed preset
    #[clap(short = 'm', long, value_enum)]
    mode: Option<SpeedMode>,

    /// longest time in milliseconds a single input poll may wait
    #[clap(long = "poll-ms")]
    poll_interval_ms: Option<u64>,

    /// print the available levels and exit
    #[clap(long)]
    list: bool,

    /// use this config file instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Command line flags win over the config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.levels_dir {
            config.levels_dir = dir.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        logging::init(path);
    }

    let store = cli.config_store();
    let mut config = cli.apply(store.load());
    let levels = level::discover(&config.levels_dir)?;

    if cli.list {
        print_levels(&levels, &mut io::stdout())?;
        return Ok(());
    }

    let preselected = match &cli.level {
        Some(name) => match levels.iter().position(|l| &l.name == name) {
            Some(idx) => Some(idx),
            None => {
                let mut cmd = Cli::command();
                cmd.error(
                    ErrorKind::InvalidValue,
                    format!("no level named '{name}' in {}", config.levels_dir.display()),
                )
                .exit();
            }
        },
        None => None,
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let events = CrosstermEventSource::new();
    let result = start_tui(&mut terminal, &events, &levels, &mut config, preselected);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if preselected.is_none() {
        if let Err(e) = persist_mode(&store, config.mode) {
            tracing::warn!(error = %e, "failed to save config");
        }
    }

    if let Some(report) = result? {
        println!("Errors: {}  Score: {}", report.errors, report.score);
    }

    Ok(())
}

fn start_tui<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    events: &E,
    levels: &[Level],
    config: &mut Config,
    preselected: Option<usize>,
) -> Result<Option<PlaythroughReport>, Box<dyn Error>> {
    let theme = Theme::from(&config.theme);

    let selected = match preselected {
        Some(idx) => idx,
        None => {
            let mut state = MenuState::new(config.mode);
            let action = run_menu(terminal, events, levels, &mut state, &theme)?;
            config.mode = state.mode;
            match action {
                MenuAction::Start => state.selected,
                MenuAction::Quit => return Ok(None),
            }
        }
    };

    let level = &levels[selected];
    let mut soundtrack = FileSoundtrack::new(&level.audio);
    let report = play_level(terminal, events, level, config, &theme, &mut soundtrack)?;

    terminal.clear()?;
    terminal.draw(|f| {
        f.render_widget(
            &GameOverView {
                report: &report,
                theme: &theme,
            },
            f.area(),
        )
    })?;
    thread::sleep(Duration::from_secs(GAME_OVER_SECS));
    soundtrack.stop();

    Ok(Some(report))
}

fn run_menu<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    events: &E,
    levels: &[Level],
    state: &mut MenuState,
    theme: &Theme,
) -> Result<MenuAction, Box<dyn Error>> {
    loop {
        let entries = menu::entries(levels);
        terminal.draw(|f| {
            f.render_widget(
                &MenuView {
                    entries: &entries,
                    selected: state.selected,
                    mode: state.mode,
                    theme,
                },
                f.area(),
            )
        })?;

        loop {
            match events.recv_timeout(Duration::from_millis(MENU_POLL_MS)) {
                Ok(GameEvent::Key(key)) => {
                    if let Some(action) = state.on_key(&key, levels.len()) {
                        return Ok(action);
                    }
                    break;
                }
                Ok(GameEvent::Resize) => break,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(MenuAction::Quit),
            }
        }
    }
}

fn play_level<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    events: &E,
    level: &Level,
    config: &Config,
    theme: &Theme,
    soundtrack: &mut FileSoundtrack,
) -> Result<PlaythroughReport, Box<dyn Error>> {
    let timeline = level.timeline()?;
    tracing::info!(level = %level.name, mode = %config.mode, "level selected");

    terminal.clear()?;
    let playthrough = Playthrough::new(timeline, config.mode.multiplier(), config.poll_interval());

    let report = {
        let mut stage = TerminalIo::new(terminal, events, *theme);
        playthrough.run(&mut stage, soundtrack)
    };

    Ok(report)
}

/// Writes back only the mode picked in the menu; one-off flags never reach the file.
fn persist_mode<S: ConfigStore>(store: &S, mode: SpeedMode) -> io::Result<()> {
    let mut stored = store.load();
    stored.mode = mode;
    store.save(&stored)
}

fn print_levels<W: Write>(levels: &[Level], out: &mut W) -> io::Result<()> {
    for entry in menu::entries(levels) {
        match entry.difficulty {
            Some(d) => writeln!(
                out,
                "{}\tdifficulty {}\tduration {}s",
                entry.name, d.speed, d.total_duration
            )?,
            None => writeln!(out, "{}\tunreadable lyrics", entry.name)?,
        }
    }
    Ok(())
}
