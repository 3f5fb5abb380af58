//! Pampa & Poeira CLI - Database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Create tables, enums and the session table
//! pampa-cli migrate
//!
//! # Insert the sample catalog (existing ids are skipped)
//! pampa-cli seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pampa-cli")]
#[command(author, version, about = "Pampa & Poeira CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert the sample catalog
    Seed {
        /// Replace products that already exist instead of skipping them
        #[arg(long)]
        overwrite: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { overwrite } => commands::seed::catalog(overwrite).await?,
    }
    Ok(())
}
