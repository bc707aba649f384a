//! Reader configuration.
//!
//! Every reader takes a [`ReaderConfig`]. The defaults suit modern files
//! (Phred+33 qualities, no record limit); a config can also be loaded from
//! JSON:
//!
//! ```
//! use genoscan::config::ReaderConfig;
//! use genoscan::utils::validation::Alphabet;
//!
//! let config = ReaderConfig::from_json(r#"{"quality_offset": 64, "alphabet": "rna"}"#).unwrap();
//! assert_eq!(config.quality_offset, 64);
//! assert_eq!(config.alphabet, Some(Alphabet::Rna));
//! assert_eq!(config.max_records, None);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::utils::validation::{check_quality_offset, Alphabet, PHRED33};

fn default_quality_offset() -> u8 {
    PHRED33
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// ASCII offset subtracted from FASTQ quality characters
    #[serde(default = "default_quality_offset")]
    pub quality_offset: u8,

    /// Alphabet used by `validate_sequence`; each format picks its own when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alphabet: Option<Alphabet>,

    /// Maximum number of records a reader will yield
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_records: Option<usize>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            quality_offset: PHRED33,
            alphabet: None,
            max_records: None,
        }
    }
}

impl ReaderConfig {
    /// Parse and validate a config from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the JSON is malformed or
    /// `Error::InvalidConfig` if a value is out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Load and validate a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, otherwise as
    /// [`ReaderConfig::from_json`].
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for an unsupported quality offset.
    pub fn validate(self) -> Result<Self> {
        check_quality_offset(self.quality_offset)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_quality_offset(mut self, offset: u8) -> Self {
        self.quality_offset = offset;
        self
    }

    #[must_use]
    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }
}
