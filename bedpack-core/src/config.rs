//! Dataset options and file-format constants.

/// First three bytes of every .bed file. The final 0x01 marks the
/// variant-major ("SNP-major") layout, the only one supported.
pub const MAGIC: [u8; 3] = [0x6C, 0x1B, 0x01];

/// Default character for a missing allele; a no-call renders as "NN".
pub const DEFAULT_MISSING_GENOTYPE: char = 'N';

pub const MATRIX_EXTENSION: &str = "bed";
pub const VARIANTS_EXTENSION: &str = "bim";
pub const SAMPLES_EXTENSION: &str = "fam";

/// How the matrix file is accessed when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Memory-map, falling back to a stream if mapping fails.
    #[default]
    Auto,
    /// Memory-map; a mapping failure fails the open.
    Mapped,
    /// Always seek and read through a file handle.
    Streamed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetOptions {
    pub missing_genotype: char,
    pub storage: StorageMode,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            missing_genotype: DEFAULT_MISSING_GENOTYPE,
            storage: StorageMode::Auto,
        }
    }
}

impl DatasetOptions {
    pub fn with_missing_genotype(mut self, missing: char) -> Self {
        self.missing_genotype = missing;
        self
    }

    pub fn with_storage(mut self, storage: StorageMode) -> Self {
        self.storage = storage;
        self
    }

    /// Shorthand for forcing [`StorageMode::Streamed`].
    pub fn without_mmap(self) -> Self {
        self.with_storage(StorageMode::Streamed)
    }
}
