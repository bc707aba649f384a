use serde::{Deserialize, Serialize};

/// A reference sequence declared in a file header
/// (`@SQ` in SAM, `##contig` in VCF)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contig {
    /// Sequence name (SN tag in SAM, ID in VCF)
    pub name: String,

    /// Sequence length (LN tag in SAM, optional `length` in VCF)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,

    /// MD5 checksum of the sequence (M5 tag in SAM)
    /// Lowercase hex, 32 characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,

    /// Assembly identifier (AS tag in SAM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,

    /// URI where sequence can be retrieved (UR tag in SAM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Species (SP tag in SAM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
}

impl Contig {
    pub fn new(name: impl Into<String>, length: Option<u64>) -> Self {
        Self {
            name: name.into(),
            length,
            md5: None,
            assembly: None,
            uri: None,
            species: None,
        }
    }

    /// Whether a 1-based position lies on this contig.
    /// Without a declared length any positive position is accepted.
    pub fn contains_position(&self, pos: i64) -> bool {
        if pos <= 0 {
            return false;
        }
        match self.length {
            Some(length) => pos.unsigned_abs() <= length,
            None => true,
        }
    }
}
