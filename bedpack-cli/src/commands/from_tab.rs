//! Build a dataset from a tab-separated genotype matrix on stdin.
//!
//! bedpack from-tab --chromosome 7 --missing 0 out < matrix.tsv
//!
//! The first line holds the sample names. Each later line is a variant id
//! followed by one genotype per sample; only the first two characters of
//! each genotype field are used.

use std::io::BufRead;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use bedpack_core::{Dataset, DatasetOptions, Sample, Variant};

#[derive(Args)]
pub struct FromTabArgs {
    /// Output dataset prefix
    output: String,

    /// Chromosome assigned to every variant
    #[arg(short, long, default_value = "0")]
    chromosome: String,
}

fn split_fields(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\r', '\n'])
        .split('\t')
        .filter(|f| !f.is_empty())
        .collect()
}

fn genotype_field(field: &str) -> &str {
    match field.char_indices().nth(2) {
        Some((end, _)) => &field[..end],
        None => field,
    }
}

pub fn read_tab<R: BufRead>(
    input: R,
    output: &str,
    chromosome: &str,
    options: DatasetOptions,
) -> Result<usize> {
    let mut lines = input.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => bail!("Empty input: expected a header line of sample names"),
    };
    let samples: Vec<Sample> = split_fields(&header).into_iter().map(Sample::new).collect();

    let mut dataset = Dataset::create_with(output, options)?;
    dataset.set_samples(samples)?;

    for (line_num, line) in lines.enumerate() {
        let line = line?;
        let fields = split_fields(&line);
        let Some((id, genotypes)) = fields.split_first() else {
            continue;
        };
        let genotypes: Vec<&str> = genotypes.iter().map(|g| genotype_field(g)).collect();
        dataset
            .append(Variant::new(*id).with_chromosome(chromosome), &genotypes)
            .with_context(|| format!("Line {}", line_num + 2))?;
    }

    let n = dataset.n_variants();
    dataset.close()?;
    Ok(n)
}

pub fn run(args: FromTabArgs, options: DatasetOptions) -> Result<()> {
    let stdin = std::io::stdin();
    let n = read_tab(stdin.lock(), &args.output, &args.chromosome, options)
        .with_context(|| format!("Failed to build {}", args.output))?;
    info!("Wrote {} variants to {}", n, args.output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::to_tab::write_tab;
    use crate::commands::to_tped::{write_tfam, write_tped};

    const MATRIX: &str = "\tind1\tind2\tind3\n\
                          rs1\tAA\tAG\tGA\n\
                          rs2\t00\tCC\tCT\n";

    #[test]
    fn test_genotype_field() {
        assert_eq!(genotype_field("AG extra"), "AG");
        assert_eq!(genotype_field("A"), "A");
    }

    #[test]
    fn test_tab_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("tab");
        let prefix = prefix.to_str().unwrap();
        let options = DatasetOptions::default().with_missing_genotype('0');

        let n = read_tab(MATRIX.as_bytes(), prefix, "7", options).unwrap();
        assert_eq!(n, 2);

        let mut ds = Dataset::open_with(prefix, options).unwrap();
        assert_eq!(ds.variants()[0].chromosome, "7");
        let mut out = Vec::new();
        write_tab(&mut ds, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\tind1\tind2\tind3\nrs1\tAA\tAG\tAG\nrs2\t00\tCC\tCT\n"
        );
    }

    #[test]
    fn test_tped_output() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("tp");
        let prefix = prefix.to_str().unwrap();
        let options = DatasetOptions::default().with_missing_genotype('0');
        read_tab(MATRIX.as_bytes(), prefix, "1", options).unwrap();

        let mut ds = Dataset::open_with(prefix, options).unwrap();
        let mut tfam = Vec::new();
        write_tfam(&ds, &mut tfam).unwrap();
        assert_eq!(
            String::from_utf8(tfam).unwrap().lines().next().unwrap(),
            "ind1 ind1 -9 -9 -9 -9"
        );
        let mut tped = Vec::new();
        assert_eq!(write_tped(&mut ds, &mut tped).unwrap(), 2);
        assert_eq!(
            String::from_utf8(tped).unwrap(),
            "1 rs1 0 0 A A A G A G\n1 rs2 0 0 0 0 C C C T\n"
        );
    }

    #[test]
    fn test_bad_genotype_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("bad");
        let input = "\ta\tb\nrs1\tAA\tAC\nrs2\tAC\tGT\n";
        let err = read_tab(input.as_bytes(), prefix.to_str().unwrap(), "0", DatasetOptions::default())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Line 3"));
    }
}
