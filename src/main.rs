use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use dmtui::app::App;
use dmtui::config::Config;
use dmtui::store::DirectTimeline;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Browse direct-message conversations in the terminal
#[derive(Parser, Debug)]
#[command(name = "dmtui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config file (defaults to ~/.config/dmtui/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file of conversations to show
    #[arg(long)]
    conversations: Option<PathBuf>,

    /// Play animated emoji without hovering
    #[arg(long)]
    autoplay: bool,

    /// Where to write logs (defaults to the user cache directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let Some(path) = path.or_else(|| dirs::cache_dir().map(|dir| dir.join("dmtui").join("dmtui.log")))
    else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    while !app.should_quit() {
        terminal.draw(|frame| app.draw(frame))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file)?;

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if args.autoplay {
        config.general.autoplay = true;
    }

    let timeline = match args.conversations.or_else(|| config.general.conversations.clone()) {
        Some(path) => DirectTimeline::load(&path)?,
        None => DirectTimeline::default(),
    };
    let mut app = App::new(&config, timeline)?;
    info!("starting with {} conversations", app.timeline().conversations().len());

    enable_raw_mode()?;
    let mut stdout = stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableMouseCapture)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
