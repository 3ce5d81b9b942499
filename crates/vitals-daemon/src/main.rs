use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use vitals_core::config::VitalsConfig;
use vitals_core::UserId;
use vitals_reminders::{ReminderStore, ReminderUpdate};
use vitals_scheduler::{
    ChannelBackend, DesktopBackend, NotificationBackend, NotificationEmitter, ReminderScheduler,
};

mod cli;
mod commands;
mod run;

use cli::{Cli, Command};

/// Buffered notifications between the scheduler and the stdout printer.
const STDOUT_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitals_daemon=info,vitals_scheduler=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > VITALS_CONFIG env > ~/.vitals/vitals.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("VITALS_CONFIG").ok());
    let config = VitalsConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        VitalsConfig::default()
    });

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");
    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    let store = ReminderStore::new(db)?;

    match cli.command {
        Command::Add {
            user,
            category,
            time,
            inactive,
        } => commands::add(&store, &UserId::from(user), &category, time.as_deref(), !inactive),
        Command::List {
            user,
            active_only,
            json,
        } => commands::list(&store, &UserId::from(user), active_only, json),
        Command::Edit {
            user,
            id,
            category,
            time,
            active,
        } => {
            let update = ReminderUpdate::parse(category.as_deref(), time.as_deref(), active)?;
            commands::edit(&store, &UserId::from(user), &id, update)
        }
        Command::Remove { user, id } => commands::remove(&store, &UserId::from(user), &id),
        Command::Run { user, stdout } => run_scheduler(config, store, UserId::from(user), stdout).await,
    }
}

async fn run_scheduler(
    config: VitalsConfig,
    store: ReminderStore,
    user: UserId,
    stdout: bool,
) -> anyhow::Result<()> {
    let backend: Box<dyn NotificationBackend> = if stdout {
        let (backend, mut rx) = ChannelBackend::new(STDOUT_CHANNEL_CAPACITY);
        // Printer task: one JSON line per fired reminder.
        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                match serde_json::to_string(&notification) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(reminder_id = %notification.tag, "cannot encode notification: {e}"),
                }
            }
        });
        Box::new(backend)
    } else {
        Box::new(DesktopBackend::from_config(&config.notifications))
    };

    let scheduler = ReminderScheduler::new(NotificationEmitter::new(backend));
    let reminder_loop = run::ReminderLoop::start(store, user, scheduler)?;
    for alarm in reminder_loop.scheduler().alarms() {
        info!(
            reminder_id = %alarm.reminder_id,
            category = %alarm.category,
            fires_at = %alarm.fires_at,
            "alarm pending"
        );
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let every = Duration::from_secs(config.scheduler.refresh_secs.max(1));
    let task = tokio::spawn(reminder_loop.run(every, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);
    task.await?;
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), "could not create database directory: {e}");
            }
        }
    }
}
