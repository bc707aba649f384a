use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Per-sample FORMAT values, keyed by FORMAT key in column order
pub type SampleValues = IndexMap<String, String>;

/// A single VCF data line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub chromosome: String,
    /// 1-based position, always >= 1
    pub position: u64,
    /// Entries of the ID column, empty for `.`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    pub reference_allele: String,
    /// ALT alleles in file order, empty for `.`
    pub alternate_alleles: Vec<String>,
    /// QUAL, `None` for `.`
    pub quality: Option<f64>,
    /// FILTER entries, empty for `.`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
    /// INFO entries; flags have no value
    pub info: IndexMap<String, Option<String>>,
    /// FORMAT keys, empty for sites-only files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format: Vec<String>,
    /// Sample name to FORMAT values
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub samples: IndexMap<String, SampleValues>,
}

impl VariantRecord {
    /// `chrom:pos` label
    pub fn locus(&self) -> String {
        format!("{}:{}", self.chromosome, self.position)
    }

    /// True if the FILTER column is `PASS` or empty
    pub fn is_pass(&self) -> bool {
        self.filters.is_empty() || self.filters.iter().all(|f| f == "PASS")
    }

    /// INFO lookup; `Some(None)` for a flag that is present
    pub fn info_value(&self, key: &str) -> Option<Option<&str>> {
        self.info.get(key).map(Option::as_deref)
    }

    /// Classification of each ALT allele against REF
    pub fn variant_types(&self) -> Vec<VariantType> {
        self.alternate_alleles
            .iter()
            .map(|alt| VariantType::classify(&self.reference_allele, alt))
            .collect()
    }
}

/// Kind of change an ALT allele makes relative to REF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantType {
    Snv,
    Insertion,
    Deletion,
    Complex,
}

impl VariantType {
    pub fn classify(reference: &str, alternate: &str) -> Self {
        let (ref_len, alt_len) = (reference.len(), alternate.len());
        if ref_len == 1 && alt_len == 1 {
            Self::Snv
        } else if ref_len < alt_len {
            Self::Insertion
        } else if ref_len > alt_len {
            Self::Deletion
        } else {
            Self::Complex
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snv => write!(f, "SNV"),
            Self::Insertion => write!(f, "Insertion"),
            Self::Deletion => write!(f, "Deletion"),
            Self::Complex => write!(f, "Complex"),
        }
    }
}

/// A parsed `GT` value such as `0/1`, `1|0` or `./.`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genotype {
    /// Allele indices, `None` for a missing call
    pub alleles: Vec<Option<usize>>,
    pub phased: bool,
}

impl Genotype {
    /// Diploid no-call, `./.`
    pub fn no_call() -> Self {
        Self {
            alleles: vec![None, None],
            phased: false,
        }
    }

    pub fn is_no_call(&self) -> bool {
        self.alleles.iter().all(Option::is_none)
    }

    pub fn is_homozygous(&self) -> bool {
        match self.alleles.first() {
            Some(Some(first)) => self.alleles.iter().all(|a| *a == Some(*first)),
            _ => false,
        }
    }

    pub fn is_heterozygous(&self) -> bool {
        !self.is_no_call() && !self.is_homozygous()
    }
}

impl FromStr for Genotype {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::format("Empty genotype"));
        }
        let phased = s.contains('|');
        let alleles = s
            .split(['/', '|'])
            .map(|allele| match allele {
                "." => Ok(None),
                index => index
                    .parse()
                    .map(Some)
                    .map_err(|_| Error::format(format!("Invalid genotype allele '{index}' in {s}"))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { alleles, phased })
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.phased { "|" } else { "/" };
        let text: Vec<String> = self
            .alleles
            .iter()
            .map(|a| a.map_or_else(|| ".".to_string(), |i| i.to_string()))
            .collect();
        write!(f, "{}", text.join(separator))
    }
}
