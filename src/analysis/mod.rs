//! Aggregate statistics and filter queries over parsed records.
//!
//! Each analyzer is built in a single pass, either from an open reader
//! (`analyze`) or from any record iterator (`from_records`). The FASTA and
//! FASTQ analyzers only keep running totals; the SAM and VCF analyzers buffer
//! their records so region and filter queries can be answered repeatedly.
//!
//! Every analyzer can produce a serializable summary for export as JSON.

pub mod fasta;
pub mod fastq;
pub mod sam;
pub mod vcf;

pub use fasta::{FastaAnalyzer, FastaSummary};
pub use fastq::{BaseComposition, FastqAnalyzer, FastqSummary};
pub use sam::{AlignmentFilter, SamAnalyzer, SamSummary};
pub use vcf::{VariantFilter, VcfAnalyzer, VcfSummary};

/// Safely convert a count to f64 for averages
///
/// Counts in practice stay far below the 2^53 limit of the f64 mantissa.
#[inline]
pub(crate) fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Arithmetic mean, 0.0 when `count` is zero
#[inline]
pub(crate) fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count_to_f64(count)
    }
}
