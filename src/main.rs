//! # Depot CLI (`depot`)
//!
//! ## Usage
//!
//! ```bash
//! depot --config ./config/depot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `depot generate` | Parse the upstream tables and write the faction documents |
//! | `depot tables` | List upstream tables, their files, and row counts |
//! | `depot stats` | Summarize the generated output directory |
//! | `depot share <roster\|collection> <path>` | Print share text for a saved file |
//!
//! ## Examples
//!
//! ```bash
//! # Check the raw export is complete
//! depot tables
//!
//! # Regenerate everything, with progress
//! depot generate --progress human
//!
//! # Only Space Marines, without writing
//! depot generate --faction SM --dry-run
//!
//! # Share a saved roster as plain text
//! depot share roster ./rosters/echo.json --format text
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use depot::share::{ShareFormat, ShareKind};
use depot::{config, ingest, logging, progress, share, stats, tables};

/// Depot CLI: normalizes the upstream rules export into per-faction JSON.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/depot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "depot",
    about = "Depot: normalizes the upstream rules export into per-faction JSON documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/depot.toml")]
    config: PathBuf,

    /// Debug-level logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the generation pipeline.
    ///
    /// Parses every upstream table, joins them per faction, and writes
    /// `factions/<slug>.json`, `core-stratagems.json` and `index.json`
    /// into the configured output directory.
    Generate {
        /// Print table row counts and per-faction datasheet counts without writing.
        #[arg(long)]
        dry_run: bool,

        /// Only build these faction ids (repeatable).
        #[arg(long = "faction")]
        factions: Vec<String>,

        /// Progress on stderr: `auto`, `human`, `json`, or `off`.
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// List upstream tables and whether a file was found for each.
    Tables,

    /// Summarize the generated output directory.
    Stats,

    /// Print share text for a saved roster or collection.
    ///
    /// Unless `--no-refresh` is given, wargear and wargear-ability
    /// selections are first re-matched against the generated faction data.
    Share {
        kind: ShareKind,

        /// Path to the saved JSON file.
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = ShareFormat::Markdown)]
        format: ShareFormat,

        /// Render the file as saved.
        #[arg(long)]
        no_refresh: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize_logging(cli.verbose, cli.quiet)?;

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Generate {
            dry_run,
            factions,
            progress: progress_flag,
        } => {
            let mode = progress::ProgressMode::from_flag(&progress_flag)?;
            let reporter: Arc<dyn progress::GenerateProgressReporter> = Arc::from(mode.reporter());
            ingest::run_generate(&cfg, dry_run, &factions, reporter).await?;
        }
        Commands::Tables => {
            tables::list_tables(&cfg)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Share {
            kind,
            path,
            format,
            no_refresh,
        } => {
            share::run_share(&cfg, kind, &path, format, !no_refresh)?;
        }
    }

    Ok(())
}
