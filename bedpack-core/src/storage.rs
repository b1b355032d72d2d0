//! Access to the packed .bed matrix file.
//!
//! Reads go through a [`MatrixSource`]: either the whole file mapped into
//! memory ([`MappedMatrix`]) or a seekable handle ([`StreamedMatrix`]).
//! Writes always stream through a [`MatrixWriter`].
//!
//! Every file starts with the 3-byte [`MAGIC`]; row `i` starts at
//! `3 + i * bytes_per_row`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::{debug, warn};

use crate::config::{StorageMode, MAGIC};
use crate::error::{BedError, Result};
use crate::traits::MatrixSource;

/// Byte offset of row `index`.
#[inline]
pub fn row_offset(index: usize, bytes_per_row: usize) -> u64 {
    (MAGIC.len() + index * bytes_per_row) as u64
}

fn truncated(path: &Path, offset: u64, len: usize, file_len: u64) -> BedError {
    BedError::format(format!(
        "Truncated bed file {}: need bytes {}..{}, file has {}",
        path.display(),
        offset,
        offset + len as u64,
        file_len
    ))
}

/// Memory-mapped .bed file.
pub struct MappedMatrix {
    // Field order matters: the mapping is dropped before the file.
    mmap: Mmap,
    _file: File,
    path: PathBuf,
}

impl MappedMatrix {
    pub fn new(file: File, path: &Path) -> std::io::Result<Self> {
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            _file: file,
            path: path.to_path_buf(),
        })
    }
}

impl MatrixSource for MappedMatrix {
    fn byte_len(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let start = offset as usize;
        let end = start + buf.len();
        if end > self.mmap.len() {
            return Err(truncated(&self.path, offset, buf.len(), self.byte_len()));
        }
        buf.copy_from_slice(&self.mmap[start..end]);
        Ok(())
    }
}

/// .bed file read through a seekable handle.
pub struct StreamedMatrix {
    reader: BufReader<File>,
    len: u64,
    path: PathBuf,
}

impl StreamedMatrix {
    pub fn new(file: File, path: &Path) -> Result<Self> {
        let len = file
            .metadata()
            .map_err(|e| BedError::io("Failed to stat bed file", path, e))?
            .len();
        Ok(Self {
            reader: BufReader::new(file),
            len,
            path: path.to_path_buf(),
        })
    }
}

impl MatrixSource for StreamedMatrix {
    fn byte_len(&self) -> u64 {
        self.len
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        if offset + buf.len() as u64 > self.len {
            return Err(truncated(&self.path, offset, buf.len(), self.len));
        }
        self.reader
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.reader.read_exact(buf))
            .map_err(|e| BedError::io("Failed to read bed file", &self.path, e))
    }
}

/// Open a .bed file for reading and check its header.
pub fn open_matrix(path: &Path, mode: StorageMode) -> Result<Box<dyn MatrixSource>> {
    let file = File::open(path).map_err(|e| BedError::io("Missing bed file", path, e))?;

    let mut source: Box<dyn MatrixSource> = match mode {
        StorageMode::Streamed => Box::new(StreamedMatrix::new(file, path)?),
        StorageMode::Mapped => Box::new(
            MappedMatrix::new(file, path)
                .map_err(|e| BedError::io("Failed to memory-map bed file", path, e))?,
        ),
        StorageMode::Auto => {
            // Mapping consumes the handle, so keep a clone for the fallback.
            let fallback = file
                .try_clone()
                .map_err(|e| BedError::io("Failed to open bed file", path, e))?;
            match MappedMatrix::new(file, path) {
                Ok(mapped) => Box::new(mapped) as Box<dyn MatrixSource>,
                Err(e) => {
                    warn!(
                        "Could not memory-map {} ({}); reading it as a stream",
                        path.display(),
                        e
                    );
                    Box::new(StreamedMatrix::new(fallback, path)?)
                }
            }
        }
    };

    verify_header(source.as_mut(), path)?;
    debug!("Opened {} ({} bytes, {:?})", path.display(), source.byte_len(), mode);
    Ok(source)
}

fn verify_header(source: &mut dyn MatrixSource, path: &Path) -> Result<()> {
    let corrupt = || {
        BedError::format(format!(
            "Corrupt or incompatible bed file: {}",
            path.display()
        ))
    };
    if source.byte_len() < MAGIC.len() as u64 {
        return Err(corrupt());
    }
    let mut header = [0u8; 3];
    source.read_at(0, &mut header)?;
    if header != MAGIC {
        return Err(corrupt());
    }
    Ok(())
}

/// Append-only writer for a new .bed file. The header is written on
/// creation.
pub struct MatrixWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    rows: usize,
}

impl MatrixWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| BedError::io("Failed to create bed file", path, e))?;
        let mut writer = Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            rows: 0,
        };
        writer.write_bytes(&MAGIC)?;
        Ok(writer)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| BedError::io("Failed to write bed file", &self.path, e))
    }

    pub fn write_row(&mut self, row: &[u8]) -> Result<()> {
        self.write_bytes(row)?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flush buffered rows and close the file.
    pub fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| BedError::io("Failed to write bed file", &self.path, e))
    }
}
