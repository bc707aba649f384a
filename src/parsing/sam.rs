//! SAM reader.
//!
//! Header lines (`@HD`, `@SQ`, `@RG`, `@PG`, `@CO`) are consumed when the
//! reader is opened and exposed as a [`SamHeader`]. Each line is checked as
//! it is read, then the whole header is validated by noodles, which also
//! supplies the reference dictionary. Every following line is one alignment
//! with at least the 11 mandatory tab-separated columns.
//!
//! ## Reference dictionary tags
//!
//! From `@SQ` lines, the following tags are extracted into [`Contig`]s:
//!
//! | Tag | Description | Required |
//! |-----|-------------|----------|
//! | SN  | Sequence name | Yes |
//! | LN  | Sequence length | Yes |
//! | M5  | MD5 checksum | No |
//! | AS  | Assembly identifier | No |
//! | UR  | URI for sequence | No |
//! | SP  | Species | No |

use indexmap::IndexSet;
use noodles::sam;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::ReaderConfig;
use crate::core::alignment::{AlignmentRecord, Flags};
use crate::core::contig::Contig;
use crate::core::header::{HeaderFields, SamHeader};
use crate::error::{Error, Result};
use crate::parsing::engine::{LineReader, RecordParser, Source};
use crate::parsing::{parse_field, GenomicDataReader, Reader};
use crate::utils::validation::normalize_md5;

/// Number of mandatory alignment columns
pub const MANDATORY_FIELDS: usize = 11;

#[derive(Debug, Default)]
pub struct SamParser {
    header: SamHeader,
    chromosomes: IndexSet<String>,
    /// Raw header lines, handed to noodles once the header ends
    header_text: String,
    header_lines: usize,
}

impl SamParser {
    pub fn header(&self) -> &SamHeader {
        &self.header
    }

    pub fn chromosomes(&self) -> &IndexSet<String> {
        &self.chromosomes
    }
}

impl RecordParser for SamParser {
    type Fragment = AlignmentRecord;
    type Record = AlignmentRecord;

    fn is_header_line(&self, line: &str) -> bool {
        line.starts_with('@')
    }

    fn parse_header_line(&mut self, line: &str) -> Result<()> {
        parse_header_line(line, &mut self.header)?;
        self.header_text.push_str(line);
        self.header_text.push('\n');
        self.header_lines += 1;
        Ok(())
    }

    fn finish_header(&mut self) -> Result<()> {
        // Whole-header errors are reported at the last header line
        self.header.contigs =
            reference_dictionary(&self.header_text).map_err(|e| e.at_line(self.header_lines))?;
        self.header_text = String::new();

        for contig in &self.header.contigs {
            self.chromosomes.insert(contig.name.clone());
        }
        debug!(
            groups = self.header.groups.len(),
            contigs = self.header.contigs.len(),
            "Parsed SAM header"
        );
        Ok(())
    }

    fn parse_line(&self, line: &str) -> Result<Option<AlignmentRecord>> {
        if line.is_empty() {
            return Ok(None);
        }
        if line.starts_with('@') {
            warn!(line = %line, "Skipping header line found after alignments");
            return Ok(None);
        }
        parse_alignment(line).map(Some)
    }

    fn push(&mut self, record: AlignmentRecord) -> Result<Option<AlignmentRecord>> {
        if record.reference_name != "*" && !self.chromosomes.contains(&record.reference_name) {
            self.chromosomes.insert(record.reference_name.clone());
        }
        Ok(Some(record))
    }
}

/// Parse one header line into `header`
///
/// # Errors
///
/// Returns `Error::InvalidFormat` if the tag is not two characters, a field
/// is not `TAG:VALUE`, or an `@SQ` line lacks a valid SN or LN.
pub fn parse_header_line(line: &str, header: &mut SamHeader) -> Result<()> {
    let mut parts = line.split('\t');
    let tag = parts
        .next()
        .and_then(|t| t.strip_prefix('@'))
        .filter(|t| t.len() == 2)
        .ok_or_else(|| Error::format(format!("Invalid SAM header tag in '{line}'")))?;

    if tag == "CO" {
        header.comments.push(line.get(4..).unwrap_or_default().to_string());
        return Ok(());
    }

    let mut fields = HeaderFields::new();
    for field in parts {
        let (key, value) = field.split_once(':').ok_or_else(|| {
            Error::format(format!("Header field '{field}' in @{tag} is not TAG:VALUE"))
        })?;
        fields.insert(key.to_string(), value.to_string());
    }

    if tag == "SQ" {
        check_reference_fields(&fields)?;
    }

    header.push_group(tag, fields);
    Ok(())
}

fn check_reference_fields(fields: &HeaderFields) -> Result<()> {
    let name = fields
        .get("SN")
        .ok_or_else(|| Error::format("@SQ line is missing SN"))?;
    let length = fields
        .get("LN")
        .ok_or_else(|| Error::format(format!("@SQ {name} is missing LN")))?;
    parse_field::<u64>(length, "LN")?;
    Ok(())
}

/// Read `text` as a noodles SAM header and build the reference dictionary
fn reference_dictionary(text: &str) -> Result<Vec<Contig>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = sam::io::Reader::new(text.as_bytes());
    let header = reader
        .read_header()
        .map_err(|e| Error::format(format!("Invalid SAM header: {e}")))?;

    Ok(contigs_from_header(&header))
}

/// Convert the `@SQ` records of a noodles header into [`Contig`]s
fn contigs_from_header(header: &sam::Header) -> Vec<Contig> {
    use noodles::sam::header::record::value::map::tag::Other;

    let mut contigs = Vec::new();

    for (name, map) in header.reference_sequences() {
        let length = map.length().get() as u64;
        let mut contig = Contig::new(name.to_string(), Some(length));

        let other = |raw: [u8; 2]| {
            Other::try_from(raw)
                .ok()
                .and_then(|tag| map.other_fields().get(&tag))
                .map(ToString::to_string)
        };

        if let Some(md5_raw) = other(*b"M5") {
            // Validate and normalize MD5 using centralized helper
            if let Some(normalized) = normalize_md5(&md5_raw) {
                contig.md5 = Some(normalized);
            } else {
                warn!(
                    contig = %contig.name,
                    md5 = %md5_raw,
                    "Invalid MD5 checksum format, ignoring"
                );
            }
        }
        contig.assembly = other(*b"AS");
        contig.uri = other(*b"UR");
        contig.species = other(*b"SP");

        contigs.push(contig);
    }

    contigs
}

/// Parse a whole header from raw text (e.g. `samtools view -H` output)
///
/// # Errors
///
/// Returns `Error::InvalidFormat` on the first malformed line, with its
/// line number, or if noodles rejects the header as a whole.
pub fn parse_header_text(text: &str) -> Result<SamHeader> {
    let mut header = SamHeader::default();
    let mut lines = String::new();
    for (i, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        parse_header_line(line, &mut header).map_err(|e| e.at_line(i + 1))?;
        lines.push_str(line);
        lines.push('\n');
    }
    header.contigs = reference_dictionary(&lines)?;
    Ok(header)
}

/// Decode the mandatory columns (and any optional tags) of one alignment line
///
/// # Errors
///
/// Returns `Error::InvalidFormat` for fewer than 11 columns or an
/// unparseable FLAG, POS, MAPQ, CIGAR, PNEXT or TLEN.
pub fn parse_alignment(line: &str) -> Result<AlignmentRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < MANDATORY_FIELDS {
        return Err(Error::format(format!(
            "Alignment line has {} fields, expected at least {MANDATORY_FIELDS}",
            fields.len()
        )));
    }

    let reference_name = fields[2].to_string();
    let mate_reference_name = match fields[6] {
        "=" => reference_name.clone(),
        other => other.to_string(),
    };

    Ok(AlignmentRecord {
        qname: fields[0].to_string(),
        flags: Flags(parse_field(fields[1], "FLAG")?),
        reference_name,
        position: parse_field(fields[3], "POS")?,
        mapping_quality: parse_field(fields[4], "MAPQ")?,
        cigar: fields[5].parse()?,
        mate_reference_name,
        mate_position: parse_field(fields[7], "PNEXT")?,
        template_length: parse_field(fields[8], "TLEN")?,
        sequence: fields[9].to_string(),
        quality: fields[10].to_string(),
        tags: fields[MANDATORY_FIELDS..]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
    })
}

#[derive(Debug)]
pub struct SamReader {
    engine: LineReader<SamParser>,
}

impl SamReader {
    pub fn new(source: Source, config: ReaderConfig) -> Self {
        Self {
            engine: LineReader::new(source, SamParser::default(), config),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::new(Source::path(path), ReaderConfig::default())
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self::new(Source::stream(reader), ReaderConfig::default())
    }

    /// Create and open in one step
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be opened or
    /// `Error::InvalidFormat` if the header is malformed.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = Self::from_path(path);
        reader.open()?;
        Ok(reader)
    }

    /// Parsed header; empty until the reader is opened
    pub fn header(&self) -> &SamHeader {
        self.engine.parser().header()
    }
}

impl Reader for SamReader {
    type Parser = SamParser;

    fn engine(&self) -> &LineReader<SamParser> {
        &self.engine
    }

    fn engine_mut(&mut self) -> &mut LineReader<SamParser> {
        &mut self.engine
    }
}

impl GenomicDataReader for SamReader {
    fn contigs(&self) -> &[Contig] {
        &self.header().contigs
    }

    fn get_chromosomes(&self) -> Vec<&str> {
        self.engine
            .parser()
            .chromosomes()
            .iter()
            .map(String::as_str)
            .collect()
    }

    fn get_reference_genome(&self) -> String {
        self.header().reference_genome().unwrap_or_default().to_string()
    }
}
