//! Centralized validation and helper functions.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Offset of the Sanger / Illumina 1.8+ quality encoding
pub const PHRED33: u8 = 33;

/// Offset of the legacy Illumina 1.3-1.7 quality encoding
pub const PHRED64: u8 = 64;

/// Symbol sets a sequence may be checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alphabet {
    /// A, C, G, T and N
    Dna,
    /// A, C, G, U and N
    Rna,
    /// The twenty standard amino acids plus B, Z, X, U, O and the `*` stop
    Protein,
    /// Any IUPAC nucleotide or amino-acid code, plus `*` and the `-` gap
    Iupac,
}

impl Alphabet {
    /// Case-insensitive membership test for a single symbol.
    #[must_use]
    pub fn contains(self, symbol: u8) -> bool {
        let upper = symbol.to_ascii_uppercase();
        match self {
            Self::Dna => matches!(upper, b'A' | b'C' | b'G' | b'T' | b'N'),
            Self::Rna => matches!(upper, b'A' | b'C' | b'G' | b'U' | b'N'),
            Self::Protein => {
                matches!(upper, b'A'..=b'Z' | b'*') && !matches!(upper, b'J')
            }
            Self::Iupac => {
                (upper.is_ascii_uppercase() && upper != b'J') || matches!(upper, b'*' | b'-')
            }
        }
    }
}

/// Validate that a string is a valid MD5 checksum (32 hex characters).
///
/// # Examples
///
/// ```
/// use genoscan::utils::validation::is_valid_md5;
///
/// assert!(is_valid_md5("6aef897c3d6ff0c78aff06ac189178dd"));
/// assert!(!is_valid_md5("not-an-md5"));
/// assert!(!is_valid_md5("6aef897c3d6ff0c78aff06ac189178d")); // 31 chars
/// ```
#[must_use]
pub fn is_valid_md5(s: &str) -> bool {
    s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize an MD5 string to lowercase.
/// Returns None if the input is not a valid MD5.
#[must_use]
pub fn normalize_md5(s: &str) -> Option<String> {
    if is_valid_md5(s) {
        Some(s.to_lowercase())
    } else {
        None
    }
}

/// Check every symbol of `sequence` against `alphabet`.
///
/// An empty sequence is not valid.
///
/// # Examples
///
/// ```
/// use genoscan::utils::validation::{is_valid_sequence, Alphabet};
///
/// assert!(is_valid_sequence("ACGTN", Alphabet::Dna));
/// assert!(is_valid_sequence("acgt", Alphabet::Dna));
/// assert!(!is_valid_sequence("ACGU", Alphabet::Dna));
/// assert!(!is_valid_sequence("", Alphabet::Dna));
/// ```
#[must_use]
pub fn is_valid_sequence(sequence: &str, alphabet: Alphabet) -> bool {
    !sequence.is_empty() && sequence.bytes().all(|b| alphabet.contains(b))
}

/// Validate a quality offset. Only Phred+33 and Phred+64 are supported.
///
/// # Errors
///
/// Returns `Error::InvalidConfig` for any other offset.
pub fn check_quality_offset(offset: u8) -> Result<u8> {
    match offset {
        PHRED33 | PHRED64 => Ok(offset),
        other => Err(Error::InvalidConfig(format!(
            "Unsupported quality offset {other}, expected {PHRED33} or {PHRED64}"
        ))),
    }
}

/// Check if yielding another record would exceed `limit`.
///
/// Call this with the current count BEFORE handing out a new record.
/// Returns an error message if the limit would be exceeded, None if safe.
#[must_use]
pub fn check_record_limit(count: usize, limit: Option<usize>) -> Option<String> {
    match limit {
        Some(max) if count >= max => Some(format!(
            "Too many records: yielding another would exceed maximum of {max}"
        )),
        _ => None,
    }
}

/// Check if the path names a gzip or bgzip compressed file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Split the body of a structured meta-line on commas, keeping commas that sit
/// inside double quotes.
///
/// This is UTF-8 safe because:
/// - Commas are single-byte ASCII (0x2C)
/// - `char_indices()` yields byte positions at character boundaries
/// - After a comma at position `i`, `i + 1` is always a valid boundary
pub fn split_structured_fields(content: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, c) in content.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(&content[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    fields.push(&content[start..]);
    fields
}
