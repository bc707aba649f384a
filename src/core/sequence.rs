use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A FASTA sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    /// Header text up to the first whitespace, without the leading `>`
    pub id: String,

    /// Remainder of the header line (empty if absent)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// All sequence lines joined
    pub sequence: String,
}

impl SequenceRecord {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        sequence: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            sequence: sequence.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Count of G and C symbols, case-insensitive
    pub fn gc_count(&self) -> usize {
        self.sequence
            .bytes()
            .filter(|b| matches!(b.to_ascii_uppercase(), b'G' | b'C'))
            .count()
    }

    /// MD5 of the uppercased sequence, the convention used by `@SQ M5` tags
    pub fn md5(&self) -> String {
        let uppercase: Vec<u8> = self.sequence.bytes().map(|b| b.to_ascii_uppercase()).collect();
        format!("{:x}", md5::compute(&uppercase))
    }
}

/// A FASTQ read. `quality[i]` is the Phred score of `sequence[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    pub sequence: String,

    pub quality: Vec<u8>,
}

impl ReadRecord {
    /// # Errors
    ///
    /// Returns `Error::InvalidFormat` if the quality and sequence lengths differ.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        sequence: impl Into<String>,
        quality: Vec<u8>,
    ) -> Result<Self> {
        let id = id.into();
        let sequence = sequence.into();
        if sequence.len() != quality.len() {
            return Err(Error::format(format!(
                "Read '{}' has {} bases but {} quality scores",
                id,
                sequence.len(),
                quality.len()
            )));
        }
        Ok(Self {
            id,
            description: description.into(),
            sequence,
            quality,
        })
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn mean_quality(&self) -> f64 {
        if self.quality.is_empty() {
            return 0.0;
        }
        let total: u64 = self.quality.iter().map(|&q| u64::from(q)).sum();
        total as f64 / self.quality.len() as f64
    }
}

/// Decode a FASTQ quality string into Phred scores.
///
/// # Errors
///
/// Returns `Error::InvalidFormat` for a character below `offset` or outside
/// printable ASCII.
pub fn decode_quality(encoded: &str, offset: u8) -> Result<Vec<u8>> {
    encoded
        .bytes()
        .map(|b| {
            if !(b'!'..=b'~').contains(&b) || b < offset {
                Err(Error::format(format!(
                    "Quality character {:?} is not valid for offset {offset}",
                    char::from(b)
                )))
            } else {
                Ok(b - offset)
            }
        })
        .collect()
}

/// Encode Phred scores back into a FASTQ quality string.
///
/// Inverse of [`decode_quality`] for the same offset.
///
/// # Examples
///
/// ```
/// use genoscan::core::sequence::{decode_quality, encode_quality};
///
/// let scores = decode_quality("II?5", 33).unwrap();
/// assert_eq!(scores, vec![40, 40, 30, 20]);
/// assert_eq!(encode_quality(&scores, 33), "II?5");
/// ```
pub fn encode_quality(scores: &[u8], offset: u8) -> String {
    scores
        .iter()
        .map(|&q| char::from(q.saturating_add(offset)))
        .collect()
}
