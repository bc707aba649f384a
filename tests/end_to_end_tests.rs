//! End-to-end tests: files on disk through readers into analyzers.

use std::io::Write;

use genoscan::{
    Error, FastaAnalyzer, FastaReader, FastqAnalyzer, FastqReader, GenomicDataReader, Reader,
    ReaderConfig, ReaderState, SamAnalyzer, SamReader, SequenceReader, Source, VcfAnalyzer,
    VcfReader,
};
use tempfile::NamedTempFile;

fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

fn write_gzipped(suffix: &str, content: &str) -> NamedTempFile {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content.as_bytes()).expect("Failed to compress");
    let compressed = encoder.finish().expect("Failed to finish gzip stream");

    let mut file = NamedTempFile::with_suffix(suffix).expect("Failed to create temp file");
    file.write_all(&compressed).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Two FASTA records of length 10 and 20 give count 2 and mean 15.0
#[test]
fn test_fasta_count_and_average_length() {
    let file = write_temp(".fa", ">seq1 first\nACGTACGTAC\n>seq2\nACGTACGTAC\nACGTACGTAC\n");

    let mut reader = FastaReader::open_path(file.path()).expect("Failed to open FASTA");
    let analyzer = FastaAnalyzer::analyze(&mut reader).expect("Failed to analyze FASTA");
    reader.close();

    assert_eq!(analyzer.count(), 2);
    assert!((analyzer.average_length() - 15.0).abs() < f64::EPSILON);
    assert_eq!(reader.state(), ReaderState::Closed);
}

/// A gzipped FASTA file reads the same as the plain one
#[test]
fn test_fasta_gzipped() {
    let file = write_gzipped(".fa.gz", ">seq1\nACGT\n>seq2\nGGCC\n");

    let mut reader = FastaReader::open_path(file.path()).expect("Failed to open FASTA");
    let record = reader.get_sequence("seq2").expect("seq2 should exist");
    assert_eq!(record.sequence, "GGCC");
    assert_eq!(record.md5(), format!("{:x}", md5::compute(b"GGCC")));
}

/// Decoding FASTQ qualities and re-encoding them reproduces the text
#[test]
fn test_fastq_quality_round_trip() {
    let qualities = ["IIIIIIII", "!\"#$%&'(", "ABCDEFGH"];
    let mut text = String::new();
    for (i, quality) in qualities.iter().enumerate() {
        text.push_str(&format!("@read{i}\nACGTACGT\n+\n{quality}\n"));
    }
    let file = write_temp(".fastq", &text);

    let mut reader = FastqReader::open_path(file.path()).expect("Failed to open FASTQ");
    let reads: Vec<_> = reader
        .read()
        .expect("Reader should be open")
        .collect::<Result<_, _>>()
        .expect("FASTQ should parse");

    assert_eq!(reads.len(), 3);
    for (read, quality) in reads.iter().zip(qualities) {
        assert_eq!(genoscan::core::sequence::encode_quality(&read.quality, 33), quality);
    }
}

/// FASTQ statistics from a Phred+64 file
#[test]
fn test_fastq_phred64_statistics() {
    let file = write_temp(".fq", "@r1\nACGT\n+\nhhhh\n@r2\nAC\n+\n@@\n");
    let config = ReaderConfig::default().with_quality_offset(64);

    let mut reader = FastqReader::new(Source::path(file.path()), config);
    reader.open().expect("Failed to open FASTQ");
    let summary = FastqAnalyzer::analyze(&mut reader)
        .expect("Failed to analyze FASTQ")
        .summary();

    assert_eq!(summary.read_count, 2);
    assert_eq!(summary.per_base_quality, vec![20.0, 20.0, 40.0, 40.0]);
    assert_eq!(summary.length_distribution.get(&2), Some(&1));
    assert_eq!(summary.length_distribution.get(&4), Some(&1));
}

/// One 50M alignment at chr1:100 covers exactly 100..=149
#[test]
fn test_sam_coverage() {
    let file = write_temp(
        ".sam",
        "@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:1000\nread1\t0\tchr1\t100\t60\t50M\t*\t0\t0\t*\t*\n",
    );

    let mut reader = SamReader::open_path(file.path()).expect("Failed to open SAM");
    assert_eq!(reader.get_chromosomes(), vec!["chr1"]);
    assert!(reader.validate_coordinate("chr1", 1000));
    assert!(!reader.validate_coordinate("chr1", 1001));

    let analyzer = SamAnalyzer::analyze(&mut reader).expect("Failed to analyze SAM");
    let coverage = analyzer.calculate_coverage("chr1");

    assert_eq!(coverage.get(&100), Some(&1));
    assert_eq!(coverage.get(&149), Some(&1));
    assert_eq!(coverage.get(&150).copied().unwrap_or(0), 0);
    assert_eq!(analyzer.count(), 1);
}

/// Per-chromosome SAM statistics and JSON export
#[test]
fn test_sam_summary_json() {
    let file = write_temp(
        ".sam",
        "@SQ\tSN:chr1\tLN:1000\tAS:GRCh38\n\
         r1\t0\tchr1\t10\t60\t10M\t*\t0\t0\t*\t*\n\
         r2\t16\tchr2\t20\t30\t10M\t*\t0\t0\t*\t*\n\
         r3\t4\t*\t0\t0\t*\t*\t0\t0\t*\t*\n",
    );

    let mut reader = SamReader::open_path(file.path()).expect("Failed to open SAM");
    assert_eq!(reader.get_reference_genome(), "GRCh38");
    let summary = SamAnalyzer::analyze(&mut reader)
        .expect("Failed to analyze SAM")
        .summary();

    let json = serde_json::to_string(&summary).expect("Failed to serialize");
    assert!(json.contains("\"chromosome_counts\":{\"chr1\":1,\"chr2\":1}"));
    assert_eq!(summary.total_alignments, 3);
    assert_eq!(summary.unmapped, 1);
}

const VCF: &str = "##fileformat=VCFv4.2
##reference=hg19
##contig=<ID=chr1,length=1000>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tALICE\tBOB
chr1\t10\t.\tA\tG\t30\tPASS\tDP=8\tGT\t0/1\t1/1
chr1\t20\t.\tG\tGA\t.\tPASS\tDP=4\tGT\t0|1
chr1\t30\t.\tTT\tT\t5.5\tq10\tDP=2\tGT\t./.\t0/0
";

/// QUAL filtering at the infinite bounds and a finite threshold
#[test]
fn test_vcf_quality_filter_bounds() {
    let file = write_temp(".vcf", VCF);

    let mut reader = VcfReader::open_path(file.path()).expect("Failed to open VCF");
    assert_eq!(reader.get_reference_genome(), "hg19");
    let analyzer = VcfAnalyzer::analyze(&mut reader).expect("Failed to analyze VCF");

    assert_eq!(analyzer.filter_by_quality(f64::NEG_INFINITY).len(), 3);
    assert!(analyzer.filter_by_quality(f64::INFINITY).is_empty());
    assert_eq!(analyzer.filter_by_quality(5.5).len(), 2);
    assert_eq!(analyzer.filter_by_quality(30.0).len(), 1);

    let summary = analyzer.summary();
    assert_eq!(summary.file_format.as_deref(), Some("VCFv4.2"));
    assert_eq!(summary.header_lines, 4);
    assert_eq!(summary.total_variants, 3);
}

/// Unknown samples are NotFound, header samples missing a column are no-calls
#[test]
fn test_vcf_genotype_lookup() {
    let file = write_temp(".vcf", VCF);

    let mut reader = VcfReader::open_path(file.path()).expect("Failed to open VCF");
    let analyzer = VcfAnalyzer::analyze(&mut reader).expect("Failed to analyze VCF");
    let variants = analyzer.variants();

    let genotype = analyzer
        .get_genotype("BOB", &variants[0])
        .expect("BOB is a header sample");
    assert_eq!(genotype.to_string(), "1/1");

    let genotype = analyzer
        .get_genotype("BOB", &variants[1])
        .expect("BOB is a header sample");
    assert!(genotype.is_no_call());

    match analyzer.get_genotype("CAROL", &variants[0]) {
        Err(Error::NotFound(message)) => assert!(message.contains("CAROL")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

/// Region queries and per-chromosome counts over a gzipped VCF
#[test]
fn test_vcf_gzipped_region() {
    let file = write_gzipped(".vcf.gz", VCF);

    let mut reader = VcfReader::open_path(file.path()).expect("Failed to open VCF");
    let analyzer = VcfAnalyzer::analyze(&mut reader).expect("Failed to analyze VCF");

    assert_eq!(analyzer.chromosome_counts().get("chr1"), Some(&3));
    assert_eq!(analyzer.variants_in_region("chr1", 10, 20).len(), 2);
    assert_eq!(analyzer.variants_in_region("chr1", 31, 1000).len(), 0);
}

/// Readers also accept in-memory streams
#[test]
fn test_stream_source() {
    let mut reader = FastaReader::from_reader(std::io::Cursor::new(b">a\nACGU\n".to_vec()));
    reader.open().expect("Failed to open stream");
    let record = reader.get_sequence("a").expect("a should exist");
    assert!(reader.validate_sequence(&record.sequence));
    assert!(reader.get_sequence("b").expect_err("stream is drained").is_not_found());
}
