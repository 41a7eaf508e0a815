// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shelf CLI
//!
//! Browse and manage files through any configured storage account.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use shelf_core::{OrderBy, OrderDirection};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "shelf")]
#[command(author, version, about = "Shelf - one file model over many storage drivers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Account store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Stored account to operate on
    #[arg(short, long, global = true, conflicts_with = "root")]
    account: Option<String>,

    /// Serve this folder through an unsaved Native account
    #[arg(long, global = true)]
    root: Option<String>,

    /// Listing order: name, size or updated_at
    #[arg(long, global = true)]
    order_by: Option<OrderBy>,

    /// Listing direction: ASC or DESC
    #[arg(long, global = true)]
    direction: Option<OrderDirection>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List a folder, or describe a file
    #[command(alias = "dir")]
    Ls {
        /// Path relative to the account root
        #[arg(default_value = "")]
        path: String,

        /// Long format with details
        #[arg(short, long)]
        long: bool,

        /// Human-readable sizes
        #[arg(short = 'H', long)]
        human: bool,
    },

    /// Show file or folder information
    Stat {
        path: String,
    },

    /// Print the direct location of a file
    Link {
        path: String,
    },

    /// Create folders, including missing parents
    Mkdir {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Move or rename
    Mv {
        source: String,
        dest: String,
    },

    /// Copy files or folders
    Cp {
        source: String,
        dest: String,
    },

    /// Remove files or folders
    Rm {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Upload a local file
    Put {
        /// Local file to read
        local: PathBuf,

        /// Destination folder relative to the account root
        #[arg(default_value = "")]
        dest: String,

        /// Name to store the file under (defaults to the local name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Describe the available drivers and their settings
    Drivers {
        /// Print the configuration schema as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored accounts
    Accounts,

    /// Create or update an account and check that it works
    Save {
        /// Account name
        name: String,

        /// Root folder of the account
        root_folder: String,

        /// Driver serving the account
        #[arg(long, default_value = "Native")]
        driver: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let ctx = match commands::Context::new(
        cli.config.as_deref(),
        cli.store.as_deref(),
        commands::AccountArgs {
            account: cli.account,
            root: cli.root,
            order_by: cli.order_by,
            direction: cli.direction,
        },
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Ls { path, long, human } => commands::ls(&ctx, &path, long, human).await,
        Commands::Stat { path } => commands::stat(&ctx, &path).await,
        Commands::Link { path } => commands::link(&ctx, &path).await,
        Commands::Mkdir { paths } => commands::mkdir(&ctx, &paths).await,
        Commands::Mv { source, dest } => commands::mv(&ctx, &source, &dest).await,
        Commands::Cp { source, dest } => commands::cp(&ctx, &source, &dest).await,
        Commands::Rm { paths } => commands::rm(&ctx, &paths).await,
        Commands::Put { local, dest, name } => commands::put(&ctx, &local, &dest, name).await,
        Commands::Drivers { json } => commands::drivers(&ctx, json),
        Commands::Accounts => commands::accounts(&ctx).await,
        Commands::Save { name, root_folder, driver } => {
            commands::save(&ctx, &name, &driver, &root_folder).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
