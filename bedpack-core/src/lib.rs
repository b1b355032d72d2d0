//! bedpack-core: reader, writer and merger for PLINK-style bed/bim/fam
//! datasets.
//!
//! A dataset stores a variant x sample genotype matrix with 2 bits per
//! call (.bed), plus one annotation line per variant (.bim) and per
//! sample (.fam). Matrices are read through a memory map or a stream and
//! are never fully decoded in memory.

pub mod alleles;
pub mod annotation;
pub mod call;
pub mod config;
pub mod dataset;
pub mod error;
pub mod merge;
pub mod storage;
pub mod traits;

pub use annotation::{Sample, Variant};
pub use call::Call;
pub use config::{DatasetOptions, StorageMode};
pub use dataset::{Dataset, DatasetState};
pub use error::{BedError, ErrorKind, Result};
pub use traits::MatrixSource;
