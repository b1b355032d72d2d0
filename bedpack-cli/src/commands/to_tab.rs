//! Dump a dataset as a tab-separated genotype matrix.
//!
//! bedpack to-tab data > data.tsv
//!
//! The header row is the sample names, each preceded by a tab; every
//! following row is a variant id and its genotype strings.

use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::Args;

use bedpack_core::{Dataset, DatasetOptions};

#[derive(Args)]
pub struct ToTabArgs {
    /// Dataset prefix
    dataset: String,
}

pub fn write_tab<W: Write>(dataset: &mut Dataset, out: &mut W) -> Result<()> {
    for sample in dataset.samples() {
        write!(out, "\t{}", sample.name)?;
    }
    writeln!(out)?;

    while let Some((variant, genotypes)) = dataset.next_variant()? {
        write!(out, "{}", variant.id)?;
        for gt in &genotypes {
            write!(out, "\t{}", gt)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn run(args: ToTabArgs, options: DatasetOptions) -> Result<()> {
    let mut dataset = Dataset::open_with(&args.dataset, options)
        .with_context(|| format!("Error opening {}", args.dataset))?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_tab(&mut dataset, &mut out)?;
    out.flush()?;

    dataset.close()?;
    Ok(())
}
