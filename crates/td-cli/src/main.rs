use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use td_cli::commands::{clear, export, prune, replay, sessions, status, tree};
use td_cli::{Cli, Commands, Config};
use td_core::types::now;
use td_core::{TabId, Tracker};
use td_db::Database;

/// Load config, ensure the database directory exists and start a tracker on
/// top of the persisted sessions.
fn open_tracker(config_path: Option<&Path>) -> Result<(Tracker<Database>, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let tracker = Tracker::start(db, now()).context("failed to load session state")?;
    Ok((tracker, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so JSON output on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut tracker, config) = open_tracker(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match command {
        Commands::Replay { file } => match file {
            Some(path) => {
                let reader = File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                replay::run(&mut out, &mut tracker, BufReader::new(reader), now())?;
            }
            None => replay::run(&mut out, &mut tracker, io::stdin().lock(), now())?,
        },
        Commands::Status => status::run(&mut out, &tracker, &config)?,
        Commands::Sessions { json } => sessions::run(&mut out, &tracker, *json)?,
        Commands::NewSession => sessions::start_new(&mut out, &mut tracker, now())?,
        Commands::Tree { session, tab, json } => tree::run(
            &mut out,
            &tracker,
            session.as_deref(),
            tab.map(TabId::new),
            *json,
        )?,
        Commands::Export => export::run(&mut out, &tracker)?,
        Commands::Prune => prune::run(&mut out, &mut tracker, &config, now())?,
        Commands::Clear { yes } => clear::run(&mut out, &mut tracker, *yes, now())?,
    }

    out.flush().context("failed to write output")?;
    Ok(())
}
