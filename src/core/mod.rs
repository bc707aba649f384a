//! Record and header value types.
//!
//! - [`SequenceRecord`] / [`ReadRecord`]: FASTA sequences and FASTQ reads
//! - [`AlignmentRecord`], [`Cigar`], [`Flags`]: SAM alignment lines
//! - [`VariantRecord`], [`Genotype`], [`VariantType`]: VCF data lines
//! - [`SamHeader`], [`VcfHeader`], [`Contig`]: parsed file headers
//!
//! Records are produced once by a reader and never mutated afterwards.
//!
//! [`SequenceRecord`]: sequence::SequenceRecord
//! [`ReadRecord`]: sequence::ReadRecord
//! [`AlignmentRecord`]: alignment::AlignmentRecord
//! [`Cigar`]: alignment::Cigar
//! [`Flags`]: alignment::Flags
//! [`VariantRecord`]: variant::VariantRecord
//! [`Genotype`]: variant::Genotype
//! [`VariantType`]: variant::VariantType
//! [`SamHeader`]: header::SamHeader
//! [`VcfHeader`]: header::VcfHeader
//! [`Contig`]: contig::Contig

pub mod alignment;
pub mod contig;
pub mod header;
pub mod sequence;
pub mod variant;
