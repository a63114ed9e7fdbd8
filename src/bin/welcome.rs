use alg_welcome::app::WelcomeApp;
use alg_welcome::config::WelcomeConfig;
use alg_welcome::desktop::DesktopEnv;
use alg_welcome::error::{Result, WelcomeError};
use alg_welcome::event::{Event, EventHandler};
use alg_welcome::install::{self, InstallMonitor};
use alg_welcome::mirrors::{
    LogRecord, Protocol, RefreshSettings, SortKey, UpdateCoordinator, UpdateRequest,
};
use alg_welcome::process::{EnvPolicy, ProcessRunner};
use alg_welcome::sink::{ChannelSink, EventSink, RunEvent};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::panic;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "alg-welcome")]
#[command(author, version, about = "Welcome panel for ALG Linux")]
struct Args {
    /// Path to config file (default: ~/.config/alg-welcome/config.toml, then /etc/alg-welcome/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Log file path (logging disabled if not specified)
    #[arg(long)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh the mirrorlist without the panel
    Mirrors {
        /// Countries to rank, repeatable or comma separated
        #[arg(long = "country", value_delimiter = ',', required = true)]
        countries: Vec<String>,

        #[arg(long = "protocol", value_enum, value_delimiter = ',')]
        protocols: Vec<Protocol>,

        /// Number of mirrors to keep
        #[arg(long)]
        latest: Option<u32>,

        #[arg(long, value_enum)]
        sort: Option<SortKey>,

        /// Download timeout in seconds
        #[arg(long)]
        timeout: Option<u32>,
    },
    /// Start the installer and wait for it to exit
    Install,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging only if log file is specified
    if let Some(ref log_path) = args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok();

        if let Some(file) = file {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();

            info!("Starting alg-welcome");
        }
    }

    let config = match args.config.as_deref() {
        Some(path) => WelcomeConfig::load_from(path)?,
        None => WelcomeConfig::load().unwrap_or_else(|e| {
            error!("Failed to load config, using defaults: {}", e);
            WelcomeConfig::default()
        }),
    };

    match args.command {
        Some(Command::Mirrors {
            countries,
            protocols,
            latest,
            sort,
            timeout,
        }) => {
            let request = UpdateRequest::new(countries)
                .with_protocols(if protocols.is_empty() {
                    config.mirrors.default_protocols.clone()
                } else {
                    protocols
                })
                .with_max_mirrors(latest.unwrap_or(config.mirrors.default_max_mirrors))
                .with_timeout_secs(timeout.unwrap_or(config.mirrors.default_timeout_secs))
                .with_sort(sort.unwrap_or(config.mirrors.default_sort));

            let code = refresh_mirrors(&config, &request).await?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Some(Command::Install) => run_installer(&config).await,
        None => run_panel(config).await,
    }
}

async fn refresh_mirrors(config: &WelcomeConfig, request: &UpdateRequest) -> Result<i32> {
    let (sink, mut rx) = ChannelSink::new();
    let sink: Arc<dyn EventSink> = Arc::new(sink);
    let coordinator = UpdateCoordinator::new(
        RefreshSettings::from_config(&config.mirrors),
        ProcessRunner::new(EnvPolicy::from_config(&config.environment)),
        Arc::downgrade(&sink),
    );

    println!("$ {}", coordinator.command_line(request));
    coordinator.start(request)?;

    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::Log(LogRecord::ServerStat { server, rate, time, .. }) => {
                println!("{server:<60} {rate:>14} {time:>10}");
            }
            RunEvent::Log(LogRecord::Warning(text)) => eprintln!("warning: {text}"),
            RunEvent::Log(LogRecord::Error(text)) => eprintln!("error: {text}"),
            RunEvent::Log(record) => println!("{}", record.raw()),
            RunEvent::Finished(code) => return Ok(code),
        }
    }

    Err(WelcomeError::Command("mirror refresh ended without a result".to_string()))
}

async fn run_installer(config: &WelcomeConfig) -> Result<()> {
    if !install::is_live_iso(&config.installer.live_marker) {
        return Err(WelcomeError::Command(
            "the installer is only available on the live ISO".to_string(),
        ));
    }

    let monitor = InstallMonitor::from_config(
        &config.installer,
        EnvPolicy::from_config(&config.environment),
    );
    monitor.launch();

    let interval = Duration::from_millis(config.installer.poll_interval_ms.max(100));
    while monitor.is_running() {
        tokio::time::sleep(interval).await;
    }
    Ok(())
}

async fn run_panel(config: WelcomeConfig) -> Result<()> {
    // Set up panic handler to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let poll_interval = Duration::from_millis(config.installer.poll_interval_ms.max(100));
    let (mut app, mut run_events) = WelcomeApp::new(config, DesktopEnv::detect());

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, &mut run_events, poll_interval).await;
    restore_terminal()?;

    // Dropping the app joins an outstanding refresh; the terminal is ours again by now
    if app.is_refreshing() {
        eprintln!("Waiting for the mirror refresh to finish...");
    }
    drop(app);

    if let Err(ref e) = result {
        error!("Welcome panel error: {}", e);
    }

    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode().map_err(|e| WelcomeError::Terminal(e.to_string()))?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| WelcomeError::Terminal(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| WelcomeError::Terminal(e.to_string()))
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().map_err(|e| WelcomeError::Terminal(e.to_string()))?;
    execute!(stdout(), LeaveAlternateScreen).map_err(|e| WelcomeError::Terminal(e.to_string()))?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut WelcomeApp,
    run_events: &mut mpsc::UnboundedReceiver<RunEvent>,
    poll_interval: Duration,
) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(250), poll_interval);

    loop {
        terminal
            .draw(|frame| alg_welcome::ui::draw(frame, &*app))
            .map_err(|e| WelcomeError::Terminal(e.to_string()))?;

        tokio::select! {
            Some(event) = run_events.recv() => app.handle_run_event(event),
            event = events.next() => match event {
                Some(Event::Key(key)) => app.handle_key(key),
                Some(Event::PollInstaller) => app.poll_installer(),
                Some(Event::Resize) | Some(Event::Tick) => {}
                None => break,
            },
        }

        if app.should_exit {
            break;
        }
    }

    Ok(())
}
