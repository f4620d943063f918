//! Sync CLI commands for mirroring to the server.

use clap::{Args, Subcommand};

use fithub_core::{StorageMode, Store};

use crate::config::Config;

/// Mirror local data to the server
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and queue state
    Status,
}

impl SyncCommand {
    pub async fn run(&self, store: &Store, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None => self.sync(store, config).await,
            Some(SyncSubcommand::Status) => {
                self.status(store, config);
                Ok(())
            }
        }
    }

    async fn sync(&self, store: &Store, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        if !config.sync.is_configured() {
            return Err("Sync is not configured. Run 'fit sync status' for details.".into());
        }
        if store.mode() == StorageMode::LocalOnly {
            return Err("Server is unreachable. Data is kept locally.".into());
        }

        println!("Syncing with server...");
        store.requeue_all();
        let report = store.sync_now().await;

        println!();
        if report.failed {
            println!(
                "✗ sync stopped: {} pushed, {} still queued",
                report.pushed, report.remaining
            );
            return Err("Sync failed. Queued changes will be retried.".into());
        }

        println!("✓ {} change(s) pushed", report.pushed);
        println!("Sync complete.");
        Ok(())
    }

    fn status(&self, store: &Store, config: &Config) {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let (Some(server_url), Some(api_key)) = (&config.sync.server_url, &config.sync.api_key)
        else {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  sync:");
            println!("    server_url: \"http://localhost:8080\"");
            println!("    api_key: \"your-api-key\"");
            println!();
            println!("Or set environment variables:");
            println!("  FIT_SYNC_URL");
            println!("  FIT_SYNC_API_KEY");
            return;
        };

        println!("Server:    {}", server_url);
        println!("API Key:   {}...", api_key.chars().take(8).collect::<String>());
        println!("Mode:      {}", store.mode());
        println!("Status:    {}", store.sync_status());
        println!("Queued:    {}", store.queue_length());
        match store.storage_info().last_sync {
            Some(at) => println!("Last sync: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("Last sync: never"),
        }
    }
}
