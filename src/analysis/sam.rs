use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::mean;
use crate::core::alignment::AlignmentRecord;
use crate::error::Result;
use crate::parsing::sam::SamReader;
use crate::parsing::Reader;

/// Criteria for [`SamAnalyzer::filter`]. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentFilter {
    #[serde(default)]
    pub chromosome: Option<String>,

    #[serde(default)]
    pub min_mapping_quality: Option<u8>,

    /// Flag bits that must all be set
    #[serde(default)]
    pub flags: Option<u16>,
}

impl AlignmentFilter {
    pub fn matches(&self, record: &AlignmentRecord) -> bool {
        if let Some(chrom) = &self.chromosome {
            if record.reference_name != *chrom {
                return false;
            }
        }
        if let Some(min) = self.min_mapping_quality {
            if record.mapping_quality < min {
                return false;
            }
        }
        self.flags.map_or(true, |mask| record.flags.contains(mask))
    }
}

/// Buffered alignments with per-chromosome tallies
#[derive(Debug, Clone, Default)]
pub struct SamAnalyzer {
    alignments: Vec<AlignmentRecord>,
    chromosome_counts: IndexMap<String, usize>,
}

/// Serializable snapshot of a [`SamAnalyzer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamSummary {
    pub total_alignments: usize,
    pub mapped: usize,
    pub unmapped: usize,
    /// Secondary or supplementary alignments
    pub non_primary: usize,
    pub mean_mapping_quality: f64,
    pub chromosome_counts: IndexMap<String, usize>,
}

impl SamAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume every remaining alignment of an open reader
    ///
    /// # Errors
    ///
    /// Returns the first error the reader yields.
    pub fn analyze(reader: &mut SamReader) -> Result<Self> {
        let mut analyzer = Self::new();
        for record in reader.read()? {
            analyzer.add(record?);
        }
        Ok(analyzer)
    }

    #[must_use]
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = AlignmentRecord>,
    {
        let mut analyzer = Self::new();
        for record in records {
            analyzer.add(record);
        }
        analyzer
    }

    pub fn add(&mut self, record: AlignmentRecord) {
        if record.reference_name != "*" {
            *self
                .chromosome_counts
                .entry(record.reference_name.clone())
                .or_default() += 1;
        }
        self.alignments.push(record);
    }

    pub fn alignments(&self) -> &[AlignmentRecord] {
        &self.alignments
    }

    /// Every alignment, unmapped ones included
    pub fn count(&self) -> usize {
        self.alignments.len()
    }

    /// Alignments per reference name in first-seen order, `*` excluded
    pub fn chromosome_counts(&self) -> &IndexMap<String, usize> {
        &self.chromosome_counts
    }

    /// Alignments on `chrom` whose start lies in `[start, end]`
    pub fn alignments_in_region(&self, chrom: &str, start: u64, end: u64) -> Vec<&AlignmentRecord> {
        self.alignments
            .iter()
            .filter(|a| a.reference_name == chrom && (start..=end).contains(&a.position))
            .collect()
    }

    /// Placed alignments on `chrom` whose reference span touches `[start, end]`
    pub fn overlapping_region(&self, chrom: &str, start: u64, end: u64) -> Vec<&AlignmentRecord> {
        self.alignments
            .iter()
            .filter(|a| a.reference_name == chrom && a.is_placed())
            .filter(|a| a.position <= end && a.end() >= start)
            .collect()
    }

    /// Alignments with every bit of `mask` set
    pub fn filter_alignments(&self, mask: u16) -> Vec<&AlignmentRecord> {
        self.alignments
            .iter()
            .filter(|a| a.flags.contains(mask))
            .collect()
    }

    pub fn filter(&self, filter: &AlignmentFilter) -> Vec<&AlignmentRecord> {
        self.alignments.iter().filter(|a| filter.matches(a)).collect()
    }

    /// Depth at each covered position of `chrom`.
    ///
    /// An alignment starting at `pos` with CIGAR reference length `L` covers
    /// `[pos, pos + L - 1]`. Positions with zero depth are absent.
    pub fn calculate_coverage(&self, chrom: &str) -> BTreeMap<u64, usize> {
        let mut coverage = BTreeMap::new();
        for alignment in &self.alignments {
            if alignment.reference_name != chrom
                || !alignment.is_placed()
                || alignment.reference_length() == 0
            {
                continue;
            }
            for position in alignment.position..=alignment.end() {
                *coverage.entry(position).or_default() += 1;
            }
        }
        coverage
    }

    /// Mean MAPQ over every alignment, 0.0 with none
    pub fn mean_mapping_quality(&self) -> f64 {
        let total: f64 = self
            .alignments
            .iter()
            .map(|a| f64::from(a.mapping_quality))
            .sum();
        mean(total, self.alignments.len())
    }

    #[must_use]
    pub fn summary(&self) -> SamSummary {
        let unmapped = self
            .alignments
            .iter()
            .filter(|a| a.flags.is_unmapped())
            .count();
        SamSummary {
            total_alignments: self.count(),
            mapped: self.count() - unmapped,
            unmapped,
            non_primary: self
                .alignments
                .iter()
                .filter(|a| a.flags.is_non_primary())
                .count(),
            mean_mapping_quality: self.mean_mapping_quality(),
            chromosome_counts: self.chromosome_counts.clone(),
        }
    }
}
