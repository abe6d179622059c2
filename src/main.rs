mod app;
mod clock;
mod config;
mod event;
mod games;
mod grid;
mod input;
mod store;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use event::{Event, EventHandler};
use games::{GameContext, GameKind};
use store::{FileStore, MemoryStore, SharedStore};

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Sixteen arcade and puzzle mini-games in the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to read.
    #[arg(short, long, default_value_os_t = Config::default_path())]
    config: PathBuf,

    /// Skip the menu and launch this game (e.g. snake, 2048, wordle).
    #[arg(short, long)]
    game: Option<String>,

    /// Fixed RNG seed for every game.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Score file, overriding the config.
    #[arg(long)]
    scores: Option<PathBuf>,
}

fn init_logging(config: &Config) {
    let path = config.log_path();
    let file = match File::create(&path) {
        Ok(file) => file,
        // no log file, no logging; the terminal belongs to the games
        Err(_) => return,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn open_store(config: &Config) -> SharedStore {
    let path = config.scores_path.clone().unwrap_or_else(FileStore::default_path);
    match FileStore::open(&path) {
        Ok(store) => Rc::new(store),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "score file unusable, best scores kept in memory");
            MemoryStore::shared()
        }
    }
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).context("entering alternate screen")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

fn run(terminal: &mut Tui, app: &mut App, events: &EventHandler) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        match events.next()? {
            Event::Key(key) => app.on_key(key, Instant::now()),
            Event::Mouse(mouse) => app.on_mouse(mouse, Instant::now()),
            Event::Tick => {}
        }
        // input arrives as a burst during key-repeat, so step after every event
        app.on_tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.scores.is_some() {
        config.scores_path = args.scores;
    }
    let start_game = match args.game.as_deref() {
        Some(slug) => match GameKind::from_slug(slug) {
            Some(kind) => Some(kind),
            None => {
                let known: Vec<_> = GameKind::ALL.iter().map(|k| k.slug()).collect();
                bail!("unknown game '{slug}', expected one of: {}", known.join(", "));
            }
        },
        None => None,
    };

    init_logging(&config);
    tracing::info!(config = %args.config.display(), seed = ?config.seed, "minicade starting");

    let ctx = GameContext {
        store: open_store(&config),
        seed: config.seed,
        minesweeper: config.minesweeper,
    };
    let mut app = App::new(ctx);
    if let Some(kind) = start_game {
        app.launch(kind, Instant::now());
    }

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        hook(info);
    }));

    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            let _ = restore_terminal();
            return Err(e);
        }
    };
    let events = EventHandler::new(config.tick_rate_ms);
    let result = run(&mut terminal, &mut app, &events);

    // scores are submitted before the screen goes away
    app.exit_game();
    restore_terminal()?;
    terminal.show_cursor()?;

    tracing::info!("minicade exiting");
    result
}
