use anyhow::{Context, Result};
use clap::{Arg, Command};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::PathBuf, time::Duration};
use tracing::{error, info};

use charla::config::{Config, DatabaseConfig};
use charla::crypto::IdentityManager;

mod app;
mod ui;

use app::App;

const POLL_RATE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("charla")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Local chat with persistent history and signed identities")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Read settings from this TOML file"),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Use this SQLite file instead of the configured one"),
        )
        .arg(
            Arg::new("export-key")
                .long("export-key")
                .action(clap::ArgAction::SetTrue)
                .help("Generate a key pair, print its public key as PEM and exit"),
        )
        .arg(
            Arg::new("no-identity")
                .long("no-identity")
                .action(clap::ArgAction::SetTrue)
                .help("Skip key generation on startup"),
        )
        .get_matches();

    let mut config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(path) = matches.get_one::<PathBuf>("database") {
        let busy_timeout_secs = config.database.busy_timeout_secs;
        config.database = DatabaseConfig {
            busy_timeout_secs,
            ..DatabaseConfig::at(path)
        };
    }

    let _log_guard = charla::logging::init(&config.logging)?;
    info!(database = %config.database.path.display(), "starting charla");

    if matches.get_flag("export-key") {
        return export_key(&config).await;
    }

    let generate_identity = config.identity.generate_on_start && !matches.get_flag("no-identity");
    let mut app = App::new(&config, generate_identity)
        .await
        .context("failed to open the conversation")?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.session.repository().store().close().await;

    if let Err(err) = res {
        error!("terminal loop failed: {err:?}");
        println!("Error: {:?}", err);
    }

    Ok(())
}

async fn export_key(config: &Config) -> Result<()> {
    let identities = IdentityManager::new(config.timeouts.crypto());
    let pair = identities
        .generate_key_pair(config.identity.modulus_bits)
        .await
        .context("failed to generate key pair")?;

    println!("{}", IdentityManager::export_public_key(pair.public_key())?);
    info!(
        fingerprint = %IdentityManager::fingerprint(pair.public_key()),
        "exported public key"
    );
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(POLL_RATE)? {
            let event = event::read()?;
            app.handle_input(event).await?;
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
