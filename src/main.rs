use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    ConfigCommand, DataCommand, DraftCommand, FoodCommand, StatsCommand, SyncCommand,
    WorkoutCommand,
};
use config::Config;
use fithub_core::{
    Backends, FileBackend, FoodRepository, HttpRemote, LocalBackend, RemoteBackend,
    SettingsRepository, StorageMode, Store, WorkoutRepository,
};

#[derive(Parser)]
#[command(name = "fit")]
#[command(version)]
#[command(about = "A local-first fitness log", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the workout in progress
    Draft(DraftCommand),

    /// Browse saved workouts
    Workout(WorkoutCommand),

    /// Log food and calories
    Food(FoodCommand),

    /// Workout statistics
    Stats(StatsCommand),

    /// Export, import and inspect stored data
    Data(DataCommand),

    /// Mirror data to the server
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fit=warn,fithub_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let store = open_store(&config).await;
    let auto_save = (config.sync.auto_save_secs > 0 && store.mode() == StorageMode::Cloud)
        .then(|| store.spawn_auto_save(Duration::from_secs(config.sync.auto_save_secs)));

    let result = match greet_first_run(&command, &store).await {
        Ok(()) => run_command(command, &store, &config).await,
        Err(e) => Err(e),
    };

    if let Some(handle) = auto_save {
        handle.abort();
    }
    let report = store.shutdown().await;
    if report.remaining > 0 {
        tracing::warn!(
            "{} change(s) not yet mirrored to the server",
            report.remaining
        );
    }

    result
}

async fn open_store(config: &Config) -> Store {
    let local: Arc<dyn LocalBackend> = Arc::new(FileBackend::new(config.data_dir.value.clone()));

    let remote: Option<Arc<dyn RemoteBackend>> =
        match (&config.sync.server_url, &config.sync.api_key) {
            (Some(url), Some(key)) => {
                let remote: Arc<dyn RemoteBackend> =
                    Arc::new(HttpRemote::new(url.as_str(), key.as_str()));
                Some(remote)
            }
            _ => None,
        };

    let backends = Backends::detect(local, remote).await;
    Store::open(config.store_config(), backends).await
}

/// Prints a one-time welcome before the first logging command.
async fn greet_first_run(command: &Commands, store: &Store) -> Result<(), Box<dyn std::error::Error>> {
    if !matches!(command, Commands::Draft(_) | Commands::Food(_)) {
        return Ok(());
    }

    let settings = SettingsRepository::new(store.clone());
    if settings.user_data().await?.has_seen_welcome {
        return Ok(());
    }

    eprintln!("Welcome to fithub! Data is stored in this device's data directory.");
    eprintln!("Run 'fit config init' to set up syncing with a server.");
    eprintln!();
    settings.mark_welcome_seen().await?;
    Ok(())
}

async fn run_command(
    command: Commands,
    store: &Store,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Draft(cmd) => {
            let repo = WorkoutRepository::new(store.clone());
            cmd.run(&repo).await
        }
        Commands::Workout(cmd) => {
            let repo = WorkoutRepository::new(store.clone());
            cmd.run(&repo).await
        }
        Commands::Food(cmd) => {
            let repo = FoodRepository::new(store.clone());
            let settings = SettingsRepository::new(store.clone());
            cmd.run(&repo, &settings).await
        }
        Commands::Stats(cmd) => {
            let repo = WorkoutRepository::new(store.clone());
            let settings = SettingsRepository::new(store.clone());
            cmd.run(&repo, &settings).await
        }
        Commands::Data(cmd) => cmd.run(store).await,
        Commands::Sync(cmd) => cmd.run(store, config).await,
        Commands::Config(cmd) => cmd.run(config),
    }
}
