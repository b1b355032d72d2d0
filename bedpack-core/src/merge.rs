//! Merging datasets that share their samples.
//!
//! Two or more datasets with the same samples (same order, same family
//! and name) and different variants are stacked into one dataset. Rows
//! are copied byte for byte; their length depends only on the sample
//! count, which is identical across inputs.
//!
//! The opposite case, datasets sharing their variants but with different
//! samples, is rejected with an explicit error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::annotation::{Sample, Variant};
use crate::config::{DatasetOptions, MATRIX_EXTENSION};
use crate::dataset::{dataset_file, Dataset, DatasetState};
use crate::error::{BedError, Result};

/// Same sample count, and the same family and name at every position.
pub fn same_samples(a: &[Sample], b: &[Sample]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x.name == y.name && x.family == y.family)
}

/// Same variant count, and the same identifier at every position.
pub fn same_variants(a: &[Variant], b: &[Variant]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}

/// Append every variant of `inputs`, in input order, to `output`.
///
/// `inputs` must be open for reading and stay open for the duration of
/// the call; `output` must be open for writing and is left open.
pub fn merge(inputs: &mut [Dataset], output: &mut Dataset) -> Result<()> {
    if inputs.len() < 2 {
        return Err(BedError::usage(format!(
            "Merging needs at least two datasets, got {}",
            inputs.len()
        )));
    }
    if let Some(d) = inputs.iter().find(|d| d.state() != DatasetState::OpenForRead) {
        return Err(BedError::usage(format!(
            "Merge input {} is not open for reading",
            d.prefix().display()
        )));
    }
    if output.state() != DatasetState::OpenForWrite {
        return Err(BedError::usage(format!(
            "Merge output {} is not open for writing",
            output.prefix().display()
        )));
    }

    let (first, second) = (&inputs[0], &inputs[1]);
    let samples_match = same_samples(first.samples(), second.samples());
    let variants_match = same_variants(first.variants(), second.variants());
    if samples_match && variants_match {
        return Err(BedError::usage(format!(
            "{} and {} are identical",
            first.prefix().display(),
            second.prefix().display()
        )));
    }
    if !samples_match && !variants_match {
        return Err(BedError::usage(format!(
            "{} and {} have neither variants nor samples in common",
            first.prefix().display(),
            second.prefix().display()
        )));
    }
    if !samples_match {
        return Err(BedError::usage(
            "Merging datasets that share variants but not samples is not supported",
        ));
    }
    for other in &inputs[2..] {
        if !same_samples(first.samples(), other.samples()) {
            return Err(BedError::usage(format!(
                "{}: mismatching samples",
                other.prefix().display()
            )));
        }
    }

    let mut seen = HashSet::new();
    for d in inputs.iter() {
        for v in d.variants() {
            if !seen.insert(v.id.as_str()) {
                warn!("Variant {} appears in more than one merge input", v.id);
            }
        }
    }

    output.set_samples(inputs[0].samples().to_vec())?;
    let mut row = vec![0u8; inputs[0].bytes_per_row()];
    for input in inputs.iter_mut() {
        for index in 0..input.n_variants() {
            let variant = input.variants()[index].clone();
            input.read_row(index, &mut row)?;
            output.append_raw(variant, &row)?;
        }
    }

    info!(
        "Merged {} datasets: {} variants, {} samples",
        inputs.len(),
        output.n_variants(),
        output.n_samples()
    );
    Ok(())
}

/// The .bed path of `prefix`, canonicalized when the file exists.
fn matrix_path(prefix: &Path) -> PathBuf {
    let path = dataset_file(prefix, MATRIX_EXTENSION);
    std::fs::canonicalize(&path).unwrap_or(path)
}

/// Open the datasets at `inputs`, merge them into a new dataset at
/// `output`, and close everything.
pub fn merge_datasets<P, Q>(inputs: &[P], output: Q, options: DatasetOptions) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    // Creating the output truncates its .bed, so it must not be an input.
    let output = output.as_ref();
    let output_matrix = matrix_path(output);
    if let Some(input) = inputs
        .iter()
        .map(AsRef::<Path>::as_ref)
        .find(|p| matrix_path(p) == output_matrix)
    {
        return Err(BedError::usage(format!(
            "{} is also a merge input ({})",
            output.display(),
            input.display()
        )));
    }

    let mut datasets = inputs
        .iter()
        .map(|p| Dataset::open_with(p, options))
        .collect::<Result<Vec<_>>>()?;
    let mut merged = Dataset::create_with(output, options)?;

    let result = merge(&mut datasets, &mut merged);
    let closed = match result {
        Ok(()) => merged.close(),
        Err(e) => {
            // Release the half-written output; its own error is secondary.
            let _ = merged.close();
            Err(e)
        }
    };
    for d in &mut datasets {
        d.close()?;
    }
    closed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_samples_checks_family_and_name() {
        let a = vec![Sample::new("s1").with_family("f1"), Sample::new("s2")];
        let mut b = a.clone();
        assert!(same_samples(&a, &b));
        b[0].father = "dad".into();
        assert!(same_samples(&a, &b));
        b[0].family = "f2".into();
        assert!(!same_samples(&a, &b));
        assert!(!same_samples(&a, &a[..1]));
    }

    #[test]
    fn test_same_variants_by_id() {
        let a = vec![Variant::new("rs1"), Variant::new("rs2")];
        let b = vec![Variant::new("rs1").with_alleles("A", "C"), Variant::new("rs2")];
        assert!(same_variants(&a, &b));
        let c = vec![Variant::new("rs2"), Variant::new("rs1")];
        assert!(!same_variants(&a, &c));
    }

    #[test]
    fn test_too_few_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Dataset::create(dir.path().join("out")).unwrap();
        let err = merge(&mut [], &mut out).unwrap_err();
        assert!(err.to_string().contains("at least two"));
        let _ = out.close();
    }
}
