//! Write a dataset as transposed PLINK text files.
//!
//! bedpack to-tped data out   # writes out.tfam and out.tped

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use bedpack_core::annotation::MISSING_FIELD;
use bedpack_core::dataset::dataset_file;
use bedpack_core::{Dataset, DatasetOptions};

/// tped marks a missing allele with 0 regardless of `--missing`.
const TPED_MISSING: char = '0';

#[derive(Args)]
pub struct ToTpedArgs {
    /// Dataset prefix
    dataset: String,

    /// Output prefix for .tped and .tfam
    output: String,
}

fn field(s: &str) -> &str {
    if s.is_empty() {
        MISSING_FIELD
    } else {
        s
    }
}

pub fn write_tfam<W: Write>(dataset: &Dataset, out: &mut W) -> Result<()> {
    for s in dataset.samples() {
        let family = if s.family.is_empty() { &s.name } else { &s.family };
        writeln!(
            out,
            "{} {} {} {} {} {}",
            family,
            s.name,
            field(&s.father),
            field(&s.mother),
            field(&s.sex),
            field(&s.phenotype)
        )?;
    }
    Ok(())
}

/// One line per variant: chromosome, id, genetic and physical position,
/// then both allele characters of every sample.
pub fn write_tped<W: Write>(dataset: &mut Dataset, out: &mut W) -> Result<usize> {
    let mut n = 0;
    while let Some((variant, genotypes)) = dataset.next_variant()? {
        write!(
            out,
            "{} {} {} {}",
            variant.chromosome, variant.id, variant.genetic_position, variant.physical_position
        )?;
        for gt in &genotypes {
            let mut alleles = gt.chars();
            let (a, b) = (alleles.next().unwrap_or_default(), alleles.next().unwrap_or_default());
            write!(out, " {} {}", a, b)?;
        }
        writeln!(out)?;
        n += 1;
    }
    Ok(n)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

pub fn run(args: ToTpedArgs, options: DatasetOptions) -> Result<()> {
    let options = options.with_missing_genotype(TPED_MISSING);
    let mut dataset = Dataset::open_with(&args.dataset, options)
        .with_context(|| format!("Error opening {}", args.dataset))?;
    let output = Path::new(&args.output);

    let mut tfam = create(&dataset_file(output, "tfam"))?;
    write_tfam(&dataset, &mut tfam)?;
    tfam.flush()?;

    let mut tped = create(&dataset_file(output, "tped"))?;
    let n = write_tped(&mut dataset, &mut tped)?;
    tped.flush()?;

    info!("Wrote {} variants to {}.tped", n, args.output);
    dataset.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedpack_core::{Sample, Variant};

    #[test]
    fn test_tfam_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut ds = Dataset::create(dir.path().join("fam")).unwrap();
        ds.set_samples(vec![Sample::new("ind1"), Sample::new("ind2").with_family("fam2")])
            .unwrap();
        let mut tfam = Vec::new();
        write_tfam(&ds, &mut tfam).unwrap();
        assert_eq!(
            String::from_utf8(tfam).unwrap(),
            "ind1 ind1 -9 -9 -9 -9\nfam2 ind2 -9 -9 -9 -9\n"
        );
        ds.append(Variant::new("rs1"), &["AA", "AA"]).unwrap();
        ds.close().unwrap();
    }

    #[test]
    fn test_no_calls_written_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("nc");
        let mut ds = Dataset::create(&prefix).unwrap();
        ds.set_samples(vec![Sample::new("ind1"), Sample::new("ind2")]).unwrap();
        ds.append(Variant::new("rs1").with_chromosome("1"), &["AG", "NN"])
            .unwrap();
        ds.close().unwrap();

        let output = dir.path().join("out");
        let args = ToTpedArgs {
            dataset: prefix.to_str().unwrap().to_string(),
            output: output.to_str().unwrap().to_string(),
        };
        run(args, DatasetOptions::default()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dataset_file(&output, "tped")).unwrap(),
            "1 rs1 0 0 A G 0 0\n"
        );
    }
}
