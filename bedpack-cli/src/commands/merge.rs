//! Merge datasets sharing the same samples.
//!
//! bedpack merge --out merged part1 part2 ...

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use bedpack_core::merge::merge_datasets;
use bedpack_core::DatasetOptions;

#[derive(Args)]
pub struct MergeArgs {
    /// Output dataset prefix
    #[arg(long)]
    out: String,

    /// Input dataset prefixes (at least two)
    #[arg(required = true, num_args = 2..)]
    inputs: Vec<String>,
}

pub fn run(args: MergeArgs, options: DatasetOptions) -> Result<()> {
    info!("Merging {} datasets into {}", args.inputs.len(), args.out);
    merge_datasets(&args.inputs, &args.out, options)
        .with_context(|| format!("Failed to merge into {}", args.out))?;
    Ok(())
}
