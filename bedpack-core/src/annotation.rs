//! Variant (.bim) and sample (.fam) annotation records.
//!
//! - .bim: chromosome, id, genetic position, physical position, allele A, allele B
//! - .fam: family, name, father, mother, sex, phenotype
//!
//! Fields are whitespace separated on read and tab separated on write.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{BedError, Result};

/// Allele symbol meaning "not known yet".
pub const UNKNOWN_ALLELE: &str = "0";

/// Value written for unset sample fields.
pub const MISSING_FIELD: &str = "-9";

/// One row of the genotype matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub id: String,
    pub chromosome: String,
    pub genetic_position: i64,
    pub physical_position: i64,
    pub allele_a: String,
    pub allele_b: String,
}

impl Default for Variant {
    fn default() -> Self {
        Self {
            id: String::new(),
            chromosome: UNKNOWN_ALLELE.to_string(),
            genetic_position: 0,
            physical_position: 0,
            allele_a: UNKNOWN_ALLELE.to_string(),
            allele_b: UNKNOWN_ALLELE.to_string(),
        }
    }
}

impl Variant {
    /// A named variant on chromosome "0" with no position and unknown alleles.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_chromosome(mut self, chromosome: impl Into<String>) -> Self {
        self.chromosome = chromosome.into();
        self
    }

    pub fn with_positions(mut self, genetic: i64, physical: i64) -> Self {
        self.genetic_position = genetic;
        self.physical_position = physical;
        self
    }

    pub fn with_alleles(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.allele_a = a.into();
        self.allele_b = b.into();
        self
    }

    /// Parse one .bim line. Absent trailing fields keep their defaults.
    pub fn from_record(record: &str) -> Result<Self> {
        let mut fields = record.split_whitespace();
        let mut variant = Variant::default();
        if let Some(chrom) = fields.next() {
            variant.chromosome = chrom.to_string();
        }
        if let Some(id) = fields.next() {
            variant.id = id.to_string();
        }
        if let Some(cm) = fields.next() {
            variant.genetic_position = parse_position(cm, "genetic position")?;
        }
        if let Some(bp) = fields.next() {
            variant.physical_position = parse_position(bp, "physical position")?;
        }
        if let Some(a) = fields.next() {
            variant.allele_a = a.to_string();
        }
        if let Some(b) = fields.next() {
            variant.allele_b = b.to_string();
        }
        Ok(variant)
    }

    pub fn to_record(&self) -> String {
        let chrom = if self.chromosome.is_empty() {
            UNKNOWN_ALLELE
        } else {
            &self.chromosome
        };
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            chrom,
            self.id,
            self.genetic_position,
            self.physical_position,
            self.allele_a,
            self.allele_b
        )
    }
}

/// Integer positions; a fractional value (centimorgans are often written
/// as `0.0`) keeps its integer part.
fn parse_position(field: &str, what: &str) -> Result<i64> {
    if let Ok(v) = field.parse::<i64>() {
        return Ok(v);
    }
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v.trunc() as i64),
        _ => Err(BedError::format(format!("Invalid {}: {}", what, field))),
    }
}

/// One column of the genotype matrix. Empty fields mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sample {
    pub family: String,
    pub name: String,
    pub father: String,
    pub mother: String,
    pub sex: String,
    pub phenotype: String,
}

impl Sample {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    /// Parse one .fam line. Absent trailing fields stay empty.
    pub fn from_record(record: &str) -> Self {
        let mut fields = record.split_whitespace().map(str::to_string);
        Sample {
            family: fields.next().unwrap_or_default(),
            name: fields.next().unwrap_or_default(),
            father: fields.next().unwrap_or_default(),
            mother: fields.next().unwrap_or_default(),
            sex: fields.next().unwrap_or_default(),
            phenotype: fields.next().unwrap_or_default(),
        }
    }

    pub fn to_record(&self) -> String {
        let or_missing = |s: &str| -> String {
            if s.is_empty() {
                MISSING_FIELD.to_string()
            } else {
                s.to_string()
            }
        };
        let family = if self.family.is_empty() {
            &self.name
        } else {
            &self.family
        };
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            family,
            self.name,
            or_missing(&self.father),
            or_missing(&self.mother),
            or_missing(&self.sex),
            or_missing(&self.phenotype)
        )
    }
}

/// Read all non-blank lines of an annotation file.
fn read_records(path: &Path, what: &str) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| BedError::io(&format!("Missing {} file", what), path, e))?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| BedError::io(&format!("Failed to read {} file", what), path, e))?;
        if !line.trim().is_empty() {
            records.push(line);
        }
    }
    if records.is_empty() {
        return Err(BedError::format(format!(
            "Empty {} file: {}",
            what,
            path.display()
        )));
    }
    Ok(records)
}

/// Parse a .bim file. A file with no records is an error.
pub fn read_variants(path: &Path) -> Result<Vec<Variant>> {
    read_records(path, "bim")?
        .iter()
        .enumerate()
        .map(|(line_num, line)| {
            Variant::from_record(line).map_err(|e| {
                BedError::format(format!("{} line {}: {}", path.display(), line_num + 1, e))
            })
        })
        .collect()
}

/// Parse a .fam file. A file with no records is an error.
pub fn read_samples(path: &Path) -> Result<Vec<Sample>> {
    Ok(read_records(path, "fam")?
        .iter()
        .map(|line| Sample::from_record(line))
        .collect())
}

fn write_records<I>(path: &Path, what: &str, records: I) -> Result<()>
where
    I: IntoIterator<Item = String>,
{
    let fail = |e| BedError::io(&format!("Failed to write {} file", what), path, e);
    let mut f = BufWriter::new(File::create(path).map_err(fail)?);
    for record in records {
        writeln!(f, "{}", record).map_err(fail)?;
    }
    f.flush().map_err(fail)
}

pub fn write_variants(path: &Path, variants: &[Variant]) -> Result<()> {
    write_records(path, "bim", variants.iter().map(Variant::to_record))
}

pub fn write_samples(path: &Path, samples: &[Sample]) -> Result<()> {
    write_records(path, "fam", samples.iter().map(Sample::to_record))
}
