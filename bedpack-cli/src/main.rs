//! bedpack: converters and merger for bed/bim/fam datasets.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bedpack_core::{DatasetOptions, StorageMode};

#[derive(Parser)]
#[command(
    name = "bedpack",
    version,
    about = "Read, write and merge PLINK-style bed/bim/fam datasets"
)]
struct Cli {
    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Character used for a missing allele in genotype strings
    #[arg(long, default_value_t = bedpack_core::config::DEFAULT_MISSING_GENOTYPE, global = true)]
    missing: char,

    /// Read .bed files through a stream instead of memory-mapping them
    #[arg(long, global = true)]
    no_mmap: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stack datasets that share the same samples
    Merge(commands::merge::MergeArgs),

    /// Print a dataset as a tab-separated genotype matrix
    ToTab(commands::to_tab::ToTabArgs),

    /// Write a dataset as transposed text (.tped/.tfam)
    ToTped(commands::to_tped::ToTpedArgs),

    /// Build a dataset from a tab-separated genotype matrix on stdin
    FromTab(commands::from_tab::FromTabArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("bedpack v{}", env!("CARGO_PKG_VERSION"));

    let storage = if cli.no_mmap {
        StorageMode::Streamed
    } else {
        StorageMode::Auto
    };
    let options = DatasetOptions::default()
        .with_missing_genotype(cli.missing)
        .with_storage(storage);

    match cli.command {
        Commands::Merge(args) => commands::merge::run(args, options),
        Commands::ToTab(args) => commands::to_tab::run(args, options),
        Commands::ToTped(args) => commands::to_tped::run(args, options),
        Commands::FromTab(args) => commands::from_tab::run(args, options),
    }
}
