//! Storage seam between the dataset and the packed matrix file.

use crate::error::Result;

/// Random byte-range access to an opened .bed file.
///
/// Implemented by a memory-mapped file and by a seekable stream. The
/// dataset only ever talks to this trait, so the choice between the two
/// is made once, when the file is opened.
pub trait MatrixSource {
    /// Total size of the file in bytes, header included.
    fn byte_len(&self) -> u64;

    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// Reading past the end of the file is a format error.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;
}
