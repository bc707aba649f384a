use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::header::VcfHeader;
use crate::core::variant::{Genotype, VariantRecord, VariantType};
use crate::error::{Error, Result};
use crate::parsing::vcf::VcfReader;
use crate::parsing::Reader;

/// Criteria for [`VcfAnalyzer::filter`]. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFilter {
    #[serde(default)]
    pub chromosome: Option<String>,

    #[serde(default)]
    pub min_position: Option<u64>,

    #[serde(default)]
    pub max_position: Option<u64>,

    /// INFO keys that must be present. A value also requires an exact match.
    #[serde(default)]
    pub info: IndexMap<String, Option<String>>,
}

impl VariantFilter {
    pub fn matches(&self, variant: &VariantRecord) -> bool {
        if self
            .chromosome
            .as_ref()
            .is_some_and(|chrom| variant.chromosome != *chrom)
        {
            return false;
        }
        if self.min_position.is_some_and(|min| variant.position < min)
            || self.max_position.is_some_and(|max| variant.position > max)
        {
            return false;
        }
        self.info.iter().all(|(key, expected)| {
            match (variant.info_value(key), expected.as_deref()) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == Some(expected),
            }
        })
    }
}

/// Buffered variants plus what the header declared
#[derive(Debug, Clone, Default)]
pub struct VcfAnalyzer {
    samples: Vec<String>,
    file_format: Option<String>,
    header_lines: usize,
    variants: Vec<VariantRecord>,
    chromosome_counts: IndexMap<String, usize>,
}

/// Serializable snapshot of a [`VcfAnalyzer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcfSummary {
    /// `##fileformat` value
    #[serde(default)]
    pub file_format: Option<String>,
    /// Meta-lines plus the `#CHROM` line
    #[serde(default)]
    pub header_lines: usize,
    pub total_variants: usize,
    pub passing: usize,
    pub samples: Vec<String>,
    pub chromosome_counts: IndexMap<String, usize>,
    pub variant_types: BTreeMap<VariantType, usize>,
}

impl VcfAnalyzer {
    #[must_use]
    pub fn new(samples: Vec<String>) -> Self {
        Self {
            samples,
            ..Self::default()
        }
    }

    /// Empty analyzer carrying the samples and file format of a header
    #[must_use]
    pub fn from_header(header: &VcfHeader) -> Self {
        Self {
            samples: header.samples.clone(),
            file_format: header.file_format().map(str::to_string),
            header_lines: header.line_count(),
            ..Self::default()
        }
    }

    /// Consume every remaining variant of an open reader
    ///
    /// # Errors
    ///
    /// Returns the first error the reader yields.
    pub fn analyze(reader: &mut VcfReader) -> Result<Self> {
        let mut analyzer = Self::from_header(reader.header());
        for variant in reader.read()? {
            analyzer.add(variant?);
        }
        Ok(analyzer)
    }

    #[must_use]
    pub fn from_records<I>(samples: Vec<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = VariantRecord>,
    {
        let mut analyzer = Self::new(samples);
        for variant in variants {
            analyzer.add(variant);
        }
        analyzer
    }

    pub fn add(&mut self, variant: VariantRecord) {
        *self
            .chromosome_counts
            .entry(variant.chromosome.clone())
            .or_default() += 1;
        self.variants.push(variant);
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn file_format(&self) -> Option<&str> {
        self.file_format.as_deref()
    }

    /// Header lines seen by [`VcfAnalyzer::analyze`], 0 when built from records
    pub fn header_lines(&self) -> usize {
        self.header_lines
    }

    pub fn variants(&self) -> &[VariantRecord] {
        &self.variants
    }

    pub fn count(&self) -> usize {
        self.variants.len()
    }

    /// Variants per chromosome in first-seen order
    pub fn chromosome_counts(&self) -> &IndexMap<String, usize> {
        &self.chromosome_counts
    }

    /// Variants on `chrom` with position in `[start, end]`
    pub fn variants_in_region(&self, chrom: &str, start: u64, end: u64) -> Vec<&VariantRecord> {
        self.variants
            .iter()
            .filter(|v| v.chromosome == chrom && (start..=end).contains(&v.position))
            .collect()
    }

    /// Variants with QUAL >= `min_quality`. A missing QUAL ranks below every
    /// number, so `f64::NEG_INFINITY` keeps everything and `f64::INFINITY`
    /// keeps nothing.
    pub fn filter_by_quality(&self, min_quality: f64) -> Vec<&VariantRecord> {
        self.variants
            .iter()
            .filter(|v| v.quality.unwrap_or(f64::NEG_INFINITY) >= min_quality)
            .collect()
    }

    pub fn filter(&self, filter: &VariantFilter) -> Vec<&VariantRecord> {
        self.variants.iter().filter(|v| filter.matches(v)).collect()
    }

    /// Genotype of `sample` at `variant`.
    ///
    /// A sample declared in the header but missing from the variant line, or
    /// lacking a `GT` value, is a no-call (`./.`).
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the header has no such sample, or
    /// `Error::InvalidFormat` if the `GT` value cannot be parsed.
    pub fn get_genotype(&self, sample: &str, variant: &VariantRecord) -> Result<Genotype> {
        if !self.samples.iter().any(|s| s == sample) {
            return Err(Error::NotFound(format!("Sample '{sample}' is not in the header")));
        }
        match variant.samples.get(sample).and_then(|values| values.get("GT")) {
            Some(gt) => gt.parse(),
            None => Ok(Genotype::no_call()),
        }
    }

    /// Tally of ALT alleles by kind. A multi-allelic site counts once per ALT.
    pub fn variant_type_counts(&self) -> BTreeMap<VariantType, usize> {
        let mut counts = BTreeMap::new();
        for kind in self.variants.iter().flat_map(VariantRecord::variant_types) {
            *counts.entry(kind).or_default() += 1;
        }
        counts
    }

    #[must_use]
    pub fn summary(&self) -> VcfSummary {
        VcfSummary {
            file_format: self.file_format.clone(),
            header_lines: self.header_lines,
            total_variants: self.count(),
            passing: self.variants.iter().filter(|v| v.is_pass()).count(),
            samples: self.samples.clone(),
            chromosome_counts: self.chromosome_counts.clone(),
            variant_types: self.variant_type_counts(),
        }
    }
}
