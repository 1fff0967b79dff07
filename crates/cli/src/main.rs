//! Stockroom CLI - data directory management and reports.
//!
//! # Usage
//!
//! ```bash
//! # Create any missing data files (admin account included)
//! stockroom seed
//!
//! # Create a customer account
//! stockroom user create -u maria -p secret -n "Maria Lopez" -e maria@example.com
//!
//! # Write a report without going through the web UI
//! stockroom export --format csv --output sales.csv --inventory
//! stockroom export --format xlsx --output report.xlsx
//! ```
//!
//! The data directory comes from `STOCKROOM_DATA_DIR` (or `.env`) unless
//! `--data-dir` is given.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use stockroom_server::config::AppConfig;
use stockroom_server::export::ExportFormat;

mod commands;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(author, version, about = "Stockroom CLI tools")]
struct Cli {
    /// Data directory, overriding `STOCKROOM_DATA_DIR`
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing data files and the admin account
    Seed,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Write a sales report to a file
    Export {
        /// Report format
        #[arg(short, long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Append inventory after the sales rows (CSV only)
        #[arg(long)]
        inventory: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a customer account
    Create {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        /// Display name (defaults to the username)
        #[arg(short, long, default_value = "")]
        name: String,

        #[arg(short, long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Xlsx,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => Self::Csv,
            Format::Xlsx => Self::Xlsx,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let mut config = AppConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Seed => commands::seed(&config).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                password,
                name,
                email,
                phone,
            } => {
                let form = stockroom_core::forms::RegistrationForm {
                    username,
                    password,
                    name,
                    email,
                    phone,
                };
                commands::create_user(&config, &form).await?;
            }
        },
        Commands::Export {
            format,
            output,
            inventory,
        } => commands::export(&config, format.into(), &output, inventory).await?,
    }
    Ok(())
}
