//! Allele inference and genotype string translation.
//!
//! Genotype strings are two characters, each an allele symbol or the
//! configured missing character. Inference assigns allele A to the first
//! symbol seen and allele B to the second; a third distinct symbol is an
//! error. Heterozygous strings are accepted in either order.

use crate::annotation::{Variant, UNKNOWN_ALLELE};
use crate::call::Call;
use crate::error::{BedError, Result};

fn is_known(symbol: &str) -> bool {
    !symbol.is_empty() && symbol != UNKNOWN_ALLELE
}

fn same_symbol(allele: &str, c: char) -> bool {
    let mut buf = [0u8; 4];
    allele == c.encode_utf8(&mut buf)
}

/// Alleles collected while scanning one variant's genotype strings.
struct AlleleScan<'a> {
    variant_id: &'a str,
    symbols: Vec<String>,
    /// Both alleles came from the annotation; new symbols are rejected.
    fixed: bool,
}

impl<'a> AlleleScan<'a> {
    fn seeded(variant: &'a Variant) -> Self {
        let symbols: Vec<String> = [&variant.allele_a, &variant.allele_b]
            .into_iter()
            .filter(|s| is_known(s))
            .cloned()
            .collect();
        let fixed = symbols.len() == 2;
        Self {
            variant_id: &variant.id,
            symbols,
            fixed,
        }
    }

    /// Index (0 = A, 1 = B) of `c`, registering it if it is new.
    fn index_of(&mut self, c: char, genotype: &str) -> Result<usize> {
        if let Some(idx) = self.symbols.iter().position(|s| same_symbol(s, c)) {
            return Ok(idx);
        }
        if self.fixed {
            return Err(BedError::format(format!(
                "Unexpected call {} for variant {} with alleles {}/{}",
                genotype, self.variant_id, self.symbols[0], self.symbols[1]
            )));
        }
        if self.symbols.len() == 2 {
            return Err(BedError::format(format!(
                "More than two alleles found for variant {}: {} {} {}",
                self.variant_id, self.symbols[0], self.symbols[1], c
            )));
        }
        self.symbols.push(c.to_string());
        Ok(self.symbols.len() - 1)
    }
}

/// Derive `variant`'s alleles from `genotypes` and translate each string
/// into a [`Call`].
///
/// Alleles already present on the variant (anything but empty or "0")
/// seed the scan. When both are present they are fixed for the variant.
/// When no allele is seen at all both are set to "0" and every call is a
/// no-call.
pub fn infer_calls<S: AsRef<str>>(
    variant: &mut Variant,
    genotypes: &[S],
    missing: char,
) -> Result<Vec<Call>> {
    let mut pairs: Vec<Option<(usize, usize)>> = Vec::with_capacity(genotypes.len());
    let symbols = {
        let mut scan = AlleleScan::seeded(variant);
        for genotype in genotypes {
            let genotype = genotype.as_ref();
            let mut chars = genotype.chars();
            let (first, second) = match (chars.next(), chars.next(), chars.next()) {
                (Some(a), Some(b), None) => (a, b),
                _ => {
                    return Err(BedError::format(format!(
                        "Unrecognised genotype '{}' for variant {}",
                        genotype, variant.id
                    )))
                }
            };
            match (first == missing, second == missing) {
                (true, true) => pairs.push(None),
                (false, false) => {
                    let a = scan.index_of(first, genotype)?;
                    let b = scan.index_of(second, genotype)?;
                    pairs.push(Some((a, b)));
                }
                _ => {
                    return Err(BedError::format(format!(
                        "Genotype {} for variant {} is missing a call for only one allele",
                        genotype, variant.id
                    )))
                }
            }
        }
        scan.symbols
    };

    let mut symbols = symbols.into_iter();
    variant.allele_a = symbols.next().unwrap_or_else(|| UNKNOWN_ALLELE.to_string());
    variant.allele_b = symbols.next().unwrap_or_else(|| UNKNOWN_ALLELE.to_string());

    Ok(pairs
        .into_iter()
        .map(|pair| match pair {
            None => Call::NoCall,
            Some((0, 0)) => Call::HomA,
            Some((1, 1)) => Call::HomB,
            Some(_) => Call::Het,
        })
        .collect())
}

/// Render calls as genotype strings using the variant's alleles.
/// Heterozygous calls always come out allele A first.
pub fn calls_to_strings(variant: &Variant, calls: &[Call], missing: char) -> Vec<String> {
    let no_call: String = [missing, missing].iter().collect();
    let (a, b) = (&variant.allele_a, &variant.allele_b);
    calls
        .iter()
        .map(|call| match call {
            Call::NoCall => no_call.clone(),
            Call::HomA => format!("{}{}", a, a),
            Call::Het => format!("{}{}", a, b),
            Call::HomB => format!("{}{}", b, b),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_first_seen_is_allele_a() {
        let mut v = Variant::new("rs1");
        let calls = infer_calls(&mut v, &["CC", "CA", "AA", "NN"], 'N').unwrap();
        assert_eq!((v.allele_a.as_str(), v.allele_b.as_str()), ("C", "A"));
        assert_eq!(calls, vec![Call::HomA, Call::Het, Call::HomB, Call::NoCall]);
    }

    #[test]
    fn test_het_strand_normalization() {
        let mut v = Variant::new("test_snp");
        let calls = infer_calls(&mut v, &["AA", "AC", "CA", "NN"], 'N').unwrap();
        assert_eq!(calls, vec![Call::HomA, Call::Het, Call::Het, Call::NoCall]);
        assert_eq!(
            calls_to_strings(&v, &calls, 'N'),
            vec!["AA", "AC", "AC", "NN"]
        );
    }

    #[test]
    fn test_monomorphic_and_all_missing() {
        let mut v = Variant::new("mono");
        let calls = infer_calls(&mut v, &["GG", "GG"], 'N').unwrap();
        assert_eq!((v.allele_a.as_str(), v.allele_b.as_str()), ("G", "0"));
        assert_eq!(calls, vec![Call::HomA, Call::HomA]);

        let mut v = Variant::new("empty");
        let calls = infer_calls(&mut v, &["00", "00"], '0').unwrap();
        assert_eq!((v.allele_a.as_str(), v.allele_b.as_str()), ("0", "0"));
        assert_eq!(calls, vec![Call::NoCall, Call::NoCall]);
    }

    #[test]
    fn test_more_than_two_alleles() {
        let mut v = Variant::new("tri");
        let err = infer_calls(&mut v, &["AA", "AC", "GG"], 'N').unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("More than two alleles"));

        // three alleles inside a single string pair count too
        let mut v = Variant::new("tri2");
        assert!(infer_calls(&mut v, &["AC", "TT"], 'N').is_err());
    }

    #[test]
    fn test_partial_missing_rejected() {
        let mut v = Variant::new("half");
        let err = infer_calls(&mut v, &["0A"], '0').unwrap_err();
        assert!(err.to_string().contains("only one allele"));
        let mut v = Variant::new("half");
        assert!(infer_calls(&mut v, &["AN"], 'N').is_err());
    }

    #[test]
    fn test_wrong_length_rejected() {
        for bad in ["A", "AAA", ""] {
            let mut v = Variant::new("len");
            let err = infer_calls(&mut v, &[bad], 'N').unwrap_err();
            assert!(err.to_string().contains("Unrecognised genotype"));
        }
    }

    #[test]
    fn test_known_alleles_are_fixed() {
        for bad in ["GG", "AG", "GA"] {
            let mut v = Variant::new("test_snp").with_alleles("A", "C");
            let err = infer_calls(&mut v, &[bad], 'N').unwrap_err();
            assert!(err.to_string().contains(bad), "{}", err);
        }

        // a known pair keeps its orientation even if B is seen first
        let mut v = Variant::new("test_snp").with_alleles("A", "C");
        let calls = infer_calls(&mut v, &["CC", "AC", "NN"], 'N').unwrap();
        assert_eq!(calls, vec![Call::HomB, Call::Het, Call::NoCall]);
        assert_eq!((v.allele_a.as_str(), v.allele_b.as_str()), ("A", "C"));
    }

    #[test]
    fn test_single_known_allele_extends() {
        let mut v = Variant::new("rs1001").with_alleles("A", "0");
        let calls = infer_calls(&mut v, &["AA", "TT"], 'N').unwrap();
        assert_eq!(v.allele_b, "T");
        assert_eq!(calls, vec![Call::HomA, Call::HomB]);
    }
}
