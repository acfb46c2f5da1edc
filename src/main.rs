//! userlist-manager binary entry point.
//!
//! Parses the command line, sets up logging, then either prints one page of
//! results (`--print`) or runs the TUI with the terminal in raw mode,
//! restoring the terminal state on exit.
//!
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use userlist_manager::app::viewconf::ViewConfig;
use userlist_manager::app::{self, AppState};
use userlist_manager::error::{Context, Result, simple_error};
use userlist_manager::loader::{BackgroundLoader, JsonFileSource};
use userlist_manager::store::{LoadOutcome, UserStore, parse_sort_spec};
use userlist_manager::ui;

/// Browse, search and edit a list of user records.
#[derive(Parser, Debug)]
#[command(name = "userlist-manager", version, about)]
struct Cli {
    /// JSON file holding the user list (overrides the config file).
    #[arg(long, env = "USERLIST_SOURCE")]
    source: Option<String>,

    /// Configuration file; created with defaults if missing.
    #[arg(long, env = "USERLIST_CONFIG", default_value = "userlist.conf")]
    config: String,

    /// Rows per page.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    per_page: Option<u16>,

    /// Sort as `field` or `field:asc|desc`, e.g. `lastName:desc`.
    #[arg(long)]
    sort: Option<String>,

    /// Initial search text.
    #[arg(long)]
    query: Option<String>,

    /// Initial page (1-based).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    page: Option<u32>,

    /// Print the selected page to stdout instead of starting the TUI.
    #[arg(long)]
    print: bool,

    /// Log file used while the TUI owns the terminal.
    #[arg(long, env = "USERLIST_LOG", default_value = "userlist-manager.log")]
    log_file: String,

    /// Write the active keybindings to this file and exit.
    #[arg(long, value_name = "PATH")]
    dump_keybinds: Option<String>,
}

/// Install the global subscriber. `RUST_LOG` wins over the default `info`.
fn init_tracing(log_file: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_ctx(|| format!("open log file {path}"))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Merge command-line overrides into the file configuration.
fn resolve_config(cli: &Cli) -> Result<ViewConfig> {
    let mut cfg = ViewConfig::load_or_init(&cli.config);
    if let Some(source) = &cli.source {
        cfg.source = source.clone();
    }
    if let Some(n) = cli.per_page {
        cfg.items_per_page = usize::from(n);
    }
    if let Some(spec) = &cli.sort {
        let (field, order) =
            parse_sort_spec(spec).map_err(|e| simple_error(format!("--sort: {e}")))?;
        cfg.sort_field = field;
        cfg.sort_order = order;
    }
    Ok(cfg)
}

fn apply_initial_view(store: &mut UserStore, cli: &Cli) {
    if let Some(q) = &cli.query {
        store.set_search_query(q.clone());
    }
    if let Some(p) = cli.page {
        store.set_page(p as usize);
    }
}

async fn print_mode(cli: &Cli, cfg: &ViewConfig) -> Result<()> {
    let source = JsonFileSource::new(&cfg.source);
    let mut store = UserStore::new();
    store.set_items_per_page(cfg.items_per_page);
    store.set_sorting(cfg.sort_field.clone(), cfg.sort_order);

    match store.load(&source).await {
        LoadOutcome::Failed(e) => return Err(e.into()),
        outcome => info!(?outcome, path = %source.path().display(), "load finished"),
    }
    apply_initial_view(&mut store, cli);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    ui::plain::write_page(&store, &mut out).with_ctx(|| "write to stdout".to_string())?;
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Run the TUI on the calling thread; fetches are spawned on `runtime`.
fn tui_mode(cli: &Cli, cfg: &ViewConfig, runtime: tokio::runtime::Handle) -> Result<()> {
    let mut app = AppState::new(cfg);
    apply_initial_view(&mut app.store, cli);
    let source = Arc::new(JsonFileSource::new(&cfg.source));
    let mut loader = BackgroundLoader::new(source, runtime);

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = app::run(&mut terminal, &mut app, &mut loader);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    Ok(())
}

/// Program entry point: dispatch to print or TUI mode and report any top-level error.
///
/// The event loop is synchronous, so it runs on the main thread outside the
/// runtime; the runtime only drives the background fetches.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.print { None } else { Some(cli.log_file.as_str()) })?;

    let cfg = resolve_config(&cli)?;
    info!(source = %cfg.source, per_page = cfg.items_per_page, "starting");

    if let Some(path) = &cli.dump_keybinds {
        let keymap = AppState::new(&cfg).keymap;
        keymap
            .write_file(path)
            .with_ctx(|| format!("write keybindings to {path}"))?;
        println!("wrote keybindings to {path}");
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .with_ctx(|| "start async runtime".to_string())?;

    if cli.print {
        runtime.block_on(print_mode(&cli, &cfg))
    } else {
        tui_mode(&cli, &cfg, runtime.handle().clone())
    }
}
