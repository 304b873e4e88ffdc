use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pairbot_core::config::PairbotConfig;
use pairbot_discord::{DiscordAdapter, SerenityMessenger};
use pairbot_engine::{AppState, HumanDateParser};
use pairbot_scheduler::PairingTrigger;
use pairbot_store::Store;

/// Discord bot that pairs community members on a weekly schedule.
#[derive(Debug, Parser)]
#[command(name = "pairbot", version, about)]
struct Cli {
    /// Path to pairbot.toml (defaults to $PAIRBOT_CONFIG, then ~/.pairbot/pairbot.toml).
    #[arg(short, long)]
    config: Option<String>,

    /// Load and validate the configuration, then exit.
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pairbot=info,pairbot_engine=info,pairbot_scheduler=info,pairbot_discord=info,serenity=warn"
                    .into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > PAIRBOT_CONFIG env > ~/.pairbot/pairbot.toml
    let config_path = cli.config.or_else(|| std::env::var("PAIRBOT_CONFIG").ok());
    let config = PairbotConfig::load(config_path.as_deref())?;
    if cli.check_config {
        info!(
            database = %config.database.path,
            trigger_hour = config.pairing.trigger_hour,
            "configuration is valid"
        );
        return Ok(());
    }

    // one SQLite file; each subsystem gets its own connection
    let db_path = &config.database.path;
    ensure_parent_dir(db_path)?;
    info!(path = %db_path, "opening SQLite database");
    let store = Arc::new(Store::new(open_db(db_path)?)?);
    let trigger_conn = open_db(db_path)?;
    info!("database migrations complete");

    // REST client shared by the trigger and the gateway handler
    let http = Arc::new(serenity::http::Http::new(&config.discord.bot_token));
    let app = Arc::new(AppState::new(
        Arc::clone(&store),
        Arc::new(SerenityMessenger::new(http)),
        Arc::new(HumanDateParser),
    ));

    let adapter = DiscordAdapter::new(&config.discord, Arc::clone(&app))?;
    let trigger = PairingTrigger::new(trigger_conn, Arc::clone(&app), &config.pairing)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let trigger_task = tokio::spawn(trigger.run(shutdown_rx));
    let adapter_task = tokio::spawn(adapter.run());
    info!("Pairbot started");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    // signal the trigger to stop; the gateway has no graceful shutdown
    let _ = shutdown_tx.send(true);
    adapter_task.abort();
    let _ = trigger_task.await;
    Ok(())
}

fn open_db(path: &str) -> rusqlite::Result<rusqlite::Connection> {
    let conn = rusqlite::Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
    Ok(conn)
}

fn ensure_parent_dir(path: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("cannot create database directory {}", parent.display())
            })?;
        }
    }
    Ok(())
}
