//! Export, import and inspect everything the store holds.

use clap::{Args, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use fithub_core::{StorageInfo, Store};

use super::OutputFormat;

#[derive(Args)]
pub struct DataCommand {
    #[command(subcommand)]
    pub command: DataSubcommand,
}

#[derive(Subcommand)]
pub enum DataSubcommand {
    /// Write a JSON snapshot of all data
    Export {
        /// Output file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replace all data with a snapshot
    Import {
        /// Snapshot file produced by `fit data export`
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Show storage usage and sync state
    Info {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete all data
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl DataCommand {
    pub async fn run(&self, store: &Store) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DataSubcommand::Export { output } => {
                let snapshot = store.export_data().await;
                let json = snapshot.to_json_pretty()?;

                match output {
                    Some(path) => {
                        fs::write(path, json)?;
                        println!(
                            "Exported {} keys to {}",
                            snapshot.data.len(),
                            path.display()
                        );
                    }
                    None => println!("{}", json),
                }
                Ok(())
            }

            DataSubcommand::Import { file, force } => {
                let text = fs::read_to_string(file)
                    .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;

                if !force && !confirm("Replace all existing data with this snapshot?")? {
                    println!("Import cancelled.");
                    return Ok(());
                }

                store.import_json(&text).await?;
                println!("Imported data from {}", file.display());
                Ok(())
            }

            DataSubcommand::Info { format } => {
                let info = store.storage_info();
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
                    OutputFormat::Text => print_info(&info),
                }
                Ok(())
            }

            DataSubcommand::Clear { force } => {
                if !force && !confirm("Delete all data?")? {
                    println!("Clear cancelled.");
                    return Ok(());
                }

                store.clear().await?;
                println!("All data deleted.");
                Ok(())
            }
        }
    }
}

fn confirm(question: &str) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn print_info(info: &StorageInfo) {
    println!("Storage");
    println!("=======\n");
    println!("Used:      {} bytes ({:.2}%)", info.size, info.usage);
    println!("Limit:     {} bytes", info.limit);
    println!("Available: {} bytes", info.available);
    println!(
        "Mode:      {}",
        if info.is_cloud_storage {
            "cloud"
        } else {
            "local"
        }
    );

    if info.is_cloud_storage {
        println!();
        println!("Sync:      {}", info.sync_status);
        println!("Queued:    {}", info.queue_length);
        match info.last_sync {
            Some(at) => println!("Last sync: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("Last sync: never"),
        }
    }
}
