//! A bed/bim/fam dataset opened for reading or writing.
//!
//! A dataset named `D` is three files: `D.bed` (packed calls), `D.bim`
//! (one variant per line) and `D.fam` (one sample per line).
//!
//! Lifecycle: `Unopened -> OpenForRead -> Closed` or
//! `Unopened -> OpenForWrite -> Closed`. A closed dataset can be opened
//! again, on the same or another prefix. Closing always clears the
//! variant, sample and name tables.
//!
//! Reads keep a cursor over the variant table. [`Dataset::lookup`] moves
//! that cursor to just after the looked-up variant, so a following
//! [`Dataset::next_variant`] continues from there. Callers rely on this to
//! jump into a dataset and then scan forward.
//!
//! A dataset is not synchronised. Several read-mode instances may share
//! the same files; two write-mode instances on the same prefix are not
//! supported and the result is undefined.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::alleles::{calls_to_strings, infer_calls};
use crate::annotation::{read_samples, read_variants, write_samples, write_variants, Sample, Variant};
use crate::call::{bytes_per_row, pack_calls, unpack_calls, Call};
use crate::config::{DatasetOptions, MATRIX_EXTENSION, SAMPLES_EXTENSION, VARIANTS_EXTENSION};
use crate::error::{BedError, Result};
use crate::storage::{open_matrix, row_offset, MatrixWriter};
use crate::traits::MatrixSource;

/// Path of one of the dataset's files: `prefix` + "." + `extension`.
pub fn dataset_file(prefix: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetState {
    Unopened,
    OpenForRead,
    OpenForWrite,
    Closed,
}

enum Backend {
    Unopened,
    Read(Box<dyn MatrixSource>),
    Write(MatrixWriter),
    Closed,
}

pub struct Dataset {
    prefix: PathBuf,
    options: DatasetOptions,
    backend: Backend,
    variants: Vec<Variant>,
    samples: Vec<Sample>,
    variant_index: HashMap<String, usize>,
    /// Index of the next variant returned by `next_variant`.
    cursor: usize,
    bytes_per_row: usize,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new(DatasetOptions::default())
    }
}

impl Dataset {
    /// An unopened dataset.
    pub fn new(options: DatasetOptions) -> Self {
        Self {
            prefix: PathBuf::new(),
            options,
            backend: Backend::Unopened,
            variants: Vec::new(),
            samples: Vec::new(),
            variant_index: HashMap::new(),
            cursor: 0,
            bytes_per_row: 0,
        }
    }

    /// Open an existing dataset for reading with default options.
    pub fn open<P: AsRef<Path>>(prefix: P) -> Result<Self> {
        Self::open_with(prefix, DatasetOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(prefix: P, options: DatasetOptions) -> Result<Self> {
        let mut dataset = Self::new(options);
        dataset.open_read(prefix)?;
        Ok(dataset)
    }

    /// Start a new dataset for writing with default options.
    pub fn create<P: AsRef<Path>>(prefix: P) -> Result<Self> {
        Self::create_with(prefix, DatasetOptions::default())
    }

    pub fn create_with<P: AsRef<Path>>(prefix: P, options: DatasetOptions) -> Result<Self> {
        let mut dataset = Self::new(options);
        dataset.open_write(prefix)?;
        Ok(dataset)
    }

    fn ensure_not_open(&self) -> Result<()> {
        match self.backend {
            Backend::Read(_) | Backend::Write(_) => Err(BedError::usage(format!(
                "Dataset {} is already open",
                self.prefix.display()
            ))),
            Backend::Unopened | Backend::Closed => Ok(()),
        }
    }

    /// Read the .bim and .fam tables and open the .bed matrix.
    pub fn open_read<P: AsRef<Path>>(&mut self, prefix: P) -> Result<()> {
        self.ensure_not_open()?;
        let prefix = prefix.as_ref();
        self.clear_tables();

        let variants = read_variants(&dataset_file(prefix, VARIANTS_EXTENSION))?;
        let samples = read_samples(&dataset_file(prefix, SAMPLES_EXTENSION))?;
        let row_len = bytes_per_row(samples.len());

        let bed_path = dataset_file(prefix, MATRIX_EXTENSION);
        let source = open_matrix(&bed_path, self.options.storage)?;
        let expected = row_offset(variants.len(), row_len);
        if source.byte_len() < expected {
            return Err(BedError::format(format!(
                "Truncated bed file {}: expected at least {} bytes for {} variants x {} samples, got {}",
                bed_path.display(),
                expected,
                variants.len(),
                samples.len(),
                source.byte_len()
            )));
        }

        self.variant_index = build_index(&variants);
        self.variants = variants;
        self.samples = samples;
        self.bytes_per_row = row_len;
        self.prefix = prefix.to_path_buf();
        self.backend = Backend::Read(source);
        self.cursor = 0;

        info!(
            "Opened {}: {} variants, {} samples",
            self.prefix.display(),
            self.variants.len(),
            self.samples.len()
        );
        Ok(())
    }

    /// Create the .bed file and write its header. Samples may already be
    /// set; the variant table starts empty and grows with each append.
    pub fn open_write<P: AsRef<Path>>(&mut self, prefix: P) -> Result<()> {
        self.ensure_not_open()?;
        let prefix = prefix.as_ref();
        let writer = MatrixWriter::create(&dataset_file(prefix, MATRIX_EXTENSION))?;

        self.variants.clear();
        self.variant_index.clear();
        self.prefix = prefix.to_path_buf();
        self.backend = Backend::Write(writer);
        self.bytes_per_row = bytes_per_row(self.samples.len());
        self.cursor = 0;

        debug!("Opened {} for writing", self.prefix.display());
        Ok(())
    }

    pub fn state(&self) -> DatasetState {
        match self.backend {
            Backend::Unopened => DatasetState::Unopened,
            Backend::Read(_) => DatasetState::OpenForRead,
            Backend::Write(_) => DatasetState::OpenForWrite,
            Backend::Closed => DatasetState::Closed,
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }

    pub fn missing_genotype(&self) -> char {
        self.options.missing_genotype
    }

    pub fn set_missing_genotype(&mut self, missing: char) {
        self.options.missing_genotype = missing;
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Variant identifier to row index. Duplicate identifiers map to the
    /// last row carrying them; earlier rows stay reachable through
    /// [`Dataset::calls_at`].
    pub fn variant_index(&self) -> &HashMap<String, usize> {
        &self.variant_index
    }

    pub fn n_variants(&self) -> usize {
        self.variants.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    /// Replace the sample table of a dataset being written. Not allowed
    /// once rows have been appended, or on a dataset open for reading.
    pub fn set_samples(&mut self, samples: Vec<Sample>) -> Result<()> {
        match &self.backend {
            Backend::Read(_) => {
                return Err(BedError::usage(format!(
                    "Cannot change samples of {}: open for reading",
                    self.prefix.display()
                )))
            }
            Backend::Write(writer) if writer.rows_written() > 0 => {
                return Err(BedError::usage(format!(
                    "Cannot change samples of {}: {} variants already written",
                    self.prefix.display(),
                    writer.rows_written()
                )))
            }
            _ => {}
        }
        self.bytes_per_row = bytes_per_row(samples.len());
        self.samples = samples;
        Ok(())
    }

    fn not_readable(&self) -> BedError {
        BedError::usage(format!(
            "Dataset {} is not open for reading",
            self.prefix.display()
        ))
    }

    /// Copy the packed bytes of row `index` into `row`.
    pub(crate) fn read_row(&mut self, index: usize, row: &mut [u8]) -> Result<()> {
        if index >= self.variants.len() {
            return Err(BedError::usage(format!(
                "Variant index {} out of range ({})",
                index,
                self.variants.len()
            )));
        }
        let offset = row_offset(index, self.bytes_per_row);
        if let Backend::Read(source) = &mut self.backend {
            return source.read_at(offset, row);
        }
        Err(self.not_readable())
    }

    /// Decode the calls of row `index` without moving the cursor.
    pub fn calls_at(&mut self, index: usize) -> Result<Vec<Call>> {
        let mut row = vec![0u8; self.bytes_per_row];
        self.read_row(index, &mut row)?;
        Ok(unpack_calls(&row, self.samples.len()))
    }

    fn genotypes_at(&mut self, index: usize) -> Result<Vec<String>> {
        let calls = self.calls_at(index)?;
        Ok(calls_to_strings(
            &self.variants[index],
            &calls,
            self.options.missing_genotype,
        ))
    }

    /// Next variant in file order with its genotype strings, or `None` at
    /// the end. The cursor moves past the row even if decoding it fails.
    pub fn next_variant(&mut self) -> Result<Option<(Variant, Vec<String>)>> {
        if !matches!(self.backend, Backend::Read(_)) {
            return Err(self.not_readable());
        }
        if self.cursor >= self.variants.len() {
            return Ok(None);
        }
        let index = self.cursor;
        self.cursor += 1;
        let genotypes = self.genotypes_at(index)?;
        Ok(Some((self.variants[index].clone(), genotypes)))
    }

    /// Genotype strings of the variant named `id`.
    ///
    /// Also moves the read cursor to the row after `id`.
    pub fn lookup(&mut self, id: &str) -> Result<Vec<String>> {
        if !matches!(self.backend, Backend::Read(_)) {
            return Err(self.not_readable());
        }
        let index = *self
            .variant_index
            .get(id)
            .ok_or_else(|| BedError::usage(format!("Unknown variant {}", id)))?;
        self.cursor = index + 1;
        self.genotypes_at(index)
    }

    /// Iterate the remaining variants from the cursor.
    pub fn records(&mut self) -> Records<'_> {
        Records {
            dataset: self,
            done: false,
        }
    }

    fn check_row_count(&self, variant: &Variant, n_genotypes: usize) -> Result<()> {
        if !matches!(self.backend, Backend::Write(_)) {
            return Err(BedError::usage(format!(
                "Dataset {} is not open for writing",
                self.prefix.display()
            )));
        }
        if n_genotypes == 0 {
            return Err(BedError::usage(format!(
                "No genotypes defined for variant {}",
                variant.id
            )));
        }
        if self.samples.is_empty() {
            return Err(BedError::usage("No samples defined"));
        }
        if n_genotypes != self.samples.len() {
            return Err(BedError::usage(format!(
                "Incorrect sample count: {} genotypes for variant {} whereas {} samples defined",
                n_genotypes,
                variant.id,
                self.samples.len()
            )));
        }
        Ok(())
    }

    /// Append a variant from its genotype strings, inferring its alleles.
    pub fn append<S: AsRef<str>>(&mut self, mut variant: Variant, genotypes: &[S]) -> Result<()> {
        self.check_row_count(&variant, genotypes.len())?;
        let calls = infer_calls(&mut variant, genotypes, self.options.missing_genotype)?;
        self.append_calls(variant, &calls)
    }

    /// Append a variant whose calls are already known.
    pub fn append_calls(&mut self, variant: Variant, calls: &[Call]) -> Result<()> {
        self.check_row_count(&variant, calls.len())?;
        let mut row = vec![0u8; self.bytes_per_row];
        pack_calls(calls, &mut row);
        self.push_row(variant, &row)
    }

    /// Append an already packed row, as copied from another dataset with
    /// the same samples.
    pub(crate) fn append_raw(&mut self, variant: Variant, row: &[u8]) -> Result<()> {
        self.check_row_count(&variant, self.samples.len())?;
        if row.len() != self.bytes_per_row {
            return Err(BedError::usage(format!(
                "Row for variant {} has {} bytes, expected {}",
                variant.id,
                row.len(),
                self.bytes_per_row
            )));
        }
        self.push_row(variant, row)
    }

    fn push_row(&mut self, variant: Variant, row: &[u8]) -> Result<()> {
        let Backend::Write(writer) = &mut self.backend else {
            return Err(BedError::usage(format!(
                "Dataset {} is not open for writing",
                self.prefix.display()
            )));
        };
        writer.write_row(row)?;
        let index = self.variants.len();
        if let Some(previous) = self.variant_index.insert(variant.id.clone(), index) {
            debug!(
                "Duplicate variant id {} at rows {} and {}",
                variant.id, previous, index
            );
        }
        self.variants.push(variant);
        Ok(())
    }

    /// Close the dataset.
    ///
    /// In write mode the .fam and .bim files are written from the
    /// in-memory tables, which must both be non-empty. In read mode the
    /// matrix is released. Either way the tables are cleared, even when
    /// an error is returned.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        let backend = std::mem::replace(&mut self.backend, Backend::Closed);
        let result = match backend {
            Backend::Write(writer) => self.finish_write(writer),
            Backend::Read(source) => {
                drop(source);
                debug!("Closed {}", self.prefix.display());
                Ok(())
            }
            Backend::Unopened | Backend::Closed => Ok(()),
        };
        self.clear_tables();
        result
    }

    fn ensure_open(&self) -> Result<()> {
        match self.backend {
            Backend::Read(_) | Backend::Write(_) => Ok(()),
            Backend::Unopened | Backend::Closed => Err(BedError::usage(format!(
                "Dataset {} is not open",
                self.prefix.display()
            ))),
        }
    }

    fn finish_write(&self, writer: MatrixWriter) -> Result<()> {
        if self.samples.is_empty() {
            return Err(BedError::usage(format!(
                "No samples to write for {}",
                self.prefix.display()
            )));
        }
        if self.variants.is_empty() {
            return Err(BedError::usage(format!(
                "No variants to write for {}",
                self.prefix.display()
            )));
        }
        writer.finish()?;
        write_samples(&dataset_file(&self.prefix, SAMPLES_EXTENSION), &self.samples)?;
        write_variants(&dataset_file(&self.prefix, VARIANTS_EXTENSION), &self.variants)?;
        info!(
            "Wrote {}: {} variants, {} samples ({} bytes)",
            self.prefix.display(),
            self.variants.len(),
            self.samples.len(),
            row_offset(self.variants.len(), self.bytes_per_row)
        );
        Ok(())
    }

    fn clear_tables(&mut self) {
        self.variants.clear();
        self.samples.clear();
        self.variant_index.clear();
        self.cursor = 0;
        self.bytes_per_row = 0;
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        if let Backend::Write(writer) = &self.backend {
            warn!(
                "Dataset {} dropped while open for writing; {} rows written, .bim/.fam not written",
                self.prefix.display(),
                writer.rows_written()
            );
        }
    }
}

fn build_index(variants: &[Variant]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(variants.len());
    let mut duplicates = 0usize;
    for (i, v) in variants.iter().enumerate() {
        if index.insert(v.id.clone(), i).is_some() {
            duplicates += 1;
        }
    }
    if duplicates > 0 {
        warn!("{} duplicate variant ids; lookups use the last occurrence", duplicates);
    }
    index
}

/// Iterator over the remaining variants of a dataset open for reading.
/// Stops after the first error.
pub struct Records<'a> {
    dataset: &'a mut Dataset,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<(Variant, Vec<String>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.dataset.next_variant().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}
