//! Genotype calls and their 2-bit packed representation.
//!
//! Calls are packed four per byte. Call 0 of each group sits in the two
//! lowest bits, call 3 in the two highest. On disk the codes are:
//!
//! | call          | in memory | on disk |
//! |---------------|-----------|---------|
//! | no-call       | 0         | `01`    |
//! | homozygous A  | 1         | `00`    |
//! | heterozygous  | 2         | `10`    |
//! | homozygous B  | 3         | `11`    |
//!
//! Reference: https://www.cog-genomics.org/plink/1.9/formats#bed

use crate::error::{BedError, Result};

/// One genotype observation for one sample at one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Call {
    #[default]
    NoCall,
    HomA,
    Het,
    HomB,
}

impl Call {
    pub const ALL: [Call; 4] = [Call::NoCall, Call::HomA, Call::Het, Call::HomB];

    /// Integer form used by callers: 0 no-call, 1 AA, 2 AB, 3 BB.
    pub fn code(self) -> u8 {
        match self {
            Call::NoCall => 0,
            Call::HomA => 1,
            Call::Het => 2,
            Call::HomB => 3,
        }
    }

    #[inline]
    fn to_bits(self) -> u8 {
        match self {
            Call::NoCall => 0b01,
            Call::HomA => 0b00,
            Call::Het => 0b10,
            Call::HomB => 0b11,
        }
    }

    #[inline]
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => Call::HomA,
            0b01 => Call::NoCall,
            0b10 => Call::Het,
            _ => Call::HomB,
        }
    }
}

impl TryFrom<u8> for Call {
    type Error = BedError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Call::NoCall),
            1 => Ok(Call::HomA),
            2 => Ok(Call::Het),
            3 => Ok(Call::HomB),
            other => Err(BedError::format(format!(
                "integer genotypes must be 0..3, got {}",
                other
            ))),
        }
    }
}

/// Number of bytes holding one variant's calls for `n_samples` samples.
#[inline]
pub fn bytes_per_row(n_samples: usize) -> usize {
    n_samples.div_ceil(4)
}

/// Pack `calls` into `row`, which must be exactly `bytes_per_row(calls.len())`
/// bytes long. Unused bit pairs of the final byte are zero.
pub fn pack_calls(calls: &[Call], row: &mut [u8]) {
    debug_assert_eq!(row.len(), bytes_per_row(calls.len()));
    row.fill(0);
    for (i, call) in calls.iter().enumerate() {
        row[i / 4] |= call.to_bits() << ((i % 4) * 2);
    }
}

/// Decode exactly `n_samples` calls from `row`, ignoring trailing padding.
pub fn unpack_calls(row: &[u8], n_samples: usize) -> Vec<Call> {
    let mut calls = Vec::with_capacity(n_samples);
    unpack_into(row, n_samples, &mut calls);
    calls
}

/// Like [`unpack_calls`] but appends to an existing buffer.
pub fn unpack_into(row: &[u8], n_samples: usize, calls: &mut Vec<Call>) {
    for sample_idx in 0..n_samples {
        let byte = row[sample_idx / 4];
        calls.push(Call::from_bits(byte >> ((sample_idx % 4) * 2)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_row() {
        assert_eq!(bytes_per_row(0), 0);
        assert_eq!(bytes_per_row(1), 1);
        assert_eq!(bytes_per_row(4), 1);
        assert_eq!(bytes_per_row(5), 2);
        assert_eq!(bytes_per_row(8), 2);
        assert_eq!(bytes_per_row(9), 3);
    }

    #[test]
    fn test_pack_byte_layout() {
        // sample3=HOM_B, sample2=HET, sample1=NO_CALL, sample0=HOM_A
        let mut row = [0u8; 1];
        pack_calls(&[Call::HomA, Call::NoCall, Call::Het, Call::HomB], &mut row);
        assert_eq!(row[0], 0b11_10_01_00);
    }

    #[test]
    fn test_unpack_offsets() {
        let calls = unpack_calls(&[0b11_10_01_00], 4);
        assert_eq!(calls, vec![Call::HomA, Call::NoCall, Call::Het, Call::HomB]);
    }

    #[test]
    fn test_partial_byte_padding() {
        let mut row = [0xFFu8; 2];
        pack_calls(&[Call::NoCall; 5], &mut row);
        assert_eq!(row, [0b01_01_01_01, 0b00_00_00_01]);

        // Padding bits are never interpreted, whatever they contain.
        let calls = unpack_calls(&[0b01_01_01_01, 0b11_11_11_01], 5);
        assert_eq!(calls, vec![Call::NoCall; 5]);
    }

    #[test]
    fn test_integer_codes() {
        for call in Call::ALL {
            assert_eq!(Call::try_from(call.code()).unwrap(), call);
        }
        let err = Call::try_from(4u8).unwrap_err();
        assert!(err.to_string().contains("0..3"));
    }
}
