//! VCF reader.
//!
//! `##` meta-lines and the `#CHROM` column line are consumed when the reader
//! is opened. Structured meta-lines such as
//! `##contig=<ID=chr1,length=248956422,assembly="GRCh38">` are split on commas
//! outside double quotes; `##contig` lines also feed the reference dictionary.
//!
//! Each data line has the 8 fixed columns, then optionally FORMAT and one
//! column per sample declared on the `#CHROM` line.

use indexmap::{IndexMap, IndexSet};
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::ReaderConfig;
use crate::core::contig::Contig;
use crate::core::header::{HeaderFields, MetaLine, VcfHeader, VCF_FIXED_COLUMNS};
use crate::core::variant::{SampleValues, VariantRecord};
use crate::error::{Error, Result};
use crate::parsing::engine::{LineReader, RecordParser, Source};
use crate::parsing::{parse_field, split_list, GenomicDataReader, Reader};
use crate::utils::validation::{normalize_md5, split_structured_fields};

#[derive(Debug, Default)]
pub struct VcfParser {
    header: VcfHeader,
    chromosomes: IndexSet<String>,
    header_done: bool,
}

impl VcfParser {
    pub fn header(&self) -> &VcfHeader {
        &self.header
    }

    pub fn chromosomes(&self) -> &IndexSet<String> {
        &self.chromosomes
    }
}

impl RecordParser for VcfParser {
    type Fragment = VariantRecord;
    type Record = VariantRecord;

    /// Blank lines before `#CHROM` are part of the header
    fn is_header_line(&self, line: &str) -> bool {
        !self.header_done && (line.trim().is_empty() || line.starts_with('#'))
    }

    fn parse_header_line(&mut self, line: &str) -> Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }
        if let Some(meta) = line.strip_prefix("##") {
            let meta = parse_meta_line(meta)?;
            if meta.key() == "contig" {
                if let MetaLine::Structured { fields, .. } = &meta {
                    self.header.contigs.push(contig_from_fields(fields)?);
                }
            }
            self.header.meta.push(meta);
            return Ok(());
        }

        let columns = line
            .strip_prefix("#CHROM")
            .map(|rest| format!("CHROM{rest}"))
            .ok_or_else(|| Error::format(format!("Unexpected header line '{line}'")))?;
        let columns: Vec<String> = columns.split('\t').map(str::to_string).collect();

        if columns.len() < VCF_FIXED_COLUMNS.len()
            || columns.iter().zip(VCF_FIXED_COLUMNS).any(|(c, f)| c != f)
        {
            return Err(Error::format(format!(
                "Column line must start with {}",
                VCF_FIXED_COLUMNS.join("\t")
            )));
        }

        self.header.samples = columns.iter().skip(9).cloned().collect();
        self.header.columns = columns;
        self.header_done = true;
        Ok(())
    }

    fn finish_header(&mut self) -> Result<()> {
        if !self.header_done {
            return Err(Error::format("Missing #CHROM column line"));
        }
        for contig in &self.header.contigs {
            self.chromosomes.insert(contig.name.clone());
        }
        debug!(
            meta_lines = self.header.meta.len(),
            samples = self.header.samples.len(),
            "Parsed VCF header"
        );
        Ok(())
    }

    fn parse_line(&self, line: &str) -> Result<Option<VariantRecord>> {
        if line.is_empty() {
            return Ok(None);
        }
        if line.starts_with('#') {
            warn!(line = %line, "Skipping header line found after variants");
            return Ok(None);
        }
        parse_variant(line, &self.header).map(Some)
    }

    fn push(&mut self, record: VariantRecord) -> Result<Option<VariantRecord>> {
        if !self.chromosomes.contains(&record.chromosome) {
            self.chromosomes.insert(record.chromosome.clone());
        }
        Ok(Some(record))
    }
}

/// Parse the text of a meta-line after the leading `##`
///
/// # Errors
///
/// Returns `Error::InvalidFormat` if the line has no `=` or a structured
/// field is not `key=value`.
pub fn parse_meta_line(meta: &str) -> Result<MetaLine> {
    let (key, value) = meta
        .split_once('=')
        .ok_or_else(|| Error::format(format!("Meta-line '##{meta}' has no '='")))?;
    let key = key.to_string();

    let Some(content) = value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) else {
        return Ok(MetaLine::Unstructured {
            key,
            value: value.to_string(),
        });
    };

    let mut fields = HeaderFields::new();
    for part in split_structured_fields(content) {
        let (name, value) = part.split_once('=').ok_or_else(|| {
            Error::format(format!("Field '{part}' in ##{key} is not key=value"))
        })?;
        // Remove quotes from value if present
        fields.insert(
            name.trim().to_string(),
            value.trim().trim_matches('"').to_string(),
        );
    }
    Ok(MetaLine::Structured { key, fields })
}

fn contig_from_fields(fields: &HeaderFields) -> Result<Contig> {
    let name = fields
        .get("ID")
        .ok_or_else(|| Error::format("##contig line is missing ID"))?;
    let length = fields
        .get("length")
        .map(|l| parse_field::<u64>(l, "contig length"))
        .transpose()?;

    let mut contig = Contig::new(name.clone(), length);
    if let Some(md5_raw) = fields.get("md5") {
        contig.md5 = normalize_md5(md5_raw);
        if contig.md5.is_none() {
            warn!(contig = %name, md5 = %md5_raw, "Invalid MD5 checksum format, ignoring");
        }
    }
    contig.assembly = fields.get("assembly").cloned();
    contig.uri = fields.get("URL").cloned();
    contig.species = fields.get("species").cloned();
    Ok(contig)
}

/// Decode one data line against the header's sample list
///
/// # Errors
///
/// Returns `Error::InvalidFormat` for fewer than 8 columns, a POS below 1,
/// an empty REF, a non-numeric or non-finite QUAL, or more sample columns
/// than the header declares.
pub fn parse_variant(line: &str, header: &VcfHeader) -> Result<VariantRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < VCF_FIXED_COLUMNS.len() {
        return Err(Error::format(format!(
            "Variant line has {} columns, expected at least {}",
            fields.len(),
            VCF_FIXED_COLUMNS.len()
        )));
    }

    let position: u64 = parse_field(fields[1], "POS")?;
    if position == 0 {
        return Err(Error::format("POS must be at least 1"));
    }
    if fields[3].is_empty() {
        return Err(Error::format("REF allele is empty"));
    }

    let quality = match fields[5] {
        "." => None,
        value => {
            let qual: f64 = parse_field(value, "QUAL")?;
            if !qual.is_finite() {
                return Err(Error::format(format!("Invalid QUAL value '{value}'")));
            }
            Some(qual)
        }
    };

    let info = split_list(fields[7], ';')
        .into_iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key.to_string(), Some(value.to_string())),
            None => (entry, None),
        })
        .collect();

    let format = fields.get(8).map_or_else(Vec::new, |f| split_list(f, ':'));

    let columns = fields.get(9..).unwrap_or_default();
    if columns.len() > header.samples.len() {
        return Err(Error::format(format!(
            "Variant line has {} sample columns but the header declares {}",
            columns.len(),
            header.samples.len()
        )));
    }
    let samples: IndexMap<String, SampleValues> = header
        .samples
        .iter()
        .zip(columns)
        .map(|(name, column)| {
            let values = format
                .iter()
                .zip(column.split(':'))
                .map(|(key, value)| (key.clone(), value.to_string()))
                .collect();
            (name.clone(), values)
        })
        .collect();

    Ok(VariantRecord {
        chromosome: fields[0].to_string(),
        position,
        ids: split_list(fields[2], ';'),
        reference_allele: fields[3].to_string(),
        alternate_alleles: split_list(fields[4], ','),
        quality,
        filters: split_list(fields[6], ';'),
        info,
        format,
        samples,
    })
}

#[derive(Debug)]
pub struct VcfReader {
    engine: LineReader<VcfParser>,
}

impl VcfReader {
    pub fn new(source: Source, config: ReaderConfig) -> Self {
        Self {
            engine: LineReader::new(source, VcfParser::default(), config),
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
    pub fn header(&self) -> &VcfHeader {
        self.engine.parser().header()
    }

    pub fn samples(&self) -> &[String] {
        &self.header().samples
    }
}

impl Reader for VcfReader {
    type Parser = VcfParser;

    fn engine(&self) -> &LineReader<VcfParser> {
        &self.engine
    }

    fn engine_mut(&mut self) -> &mut LineReader<VcfParser> {
        &mut self.engine
    }
}

impl GenomicDataReader for VcfReader {
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
        self.header().reference().unwrap_or_default().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::ReaderState;
    use std::io::Cursor;

    const VCF: &str = "##fileformat=VCFv4.2
##reference=GRCh38
##contig=<ID=chr1,length=248956422,md5=6aef897c3d6ff0c78aff06ac189178dd,assembly=GRCh38>
##contig=<ID=chr2,length=242193529>
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total depth, all samples\">
##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\tNA002
chr1\t100\trs1\tA\tG,T\t50.5\tPASS\tDP=20;DB\tGT:DP\t0/1:10\t1|1:12
chr2\t200\t.\tAT\tA\t.\tq10;lowDP\t.\tGT\t./.
chr3\t5\t.\tC\tCAA\t10\t.\tDP=3
";

    fn open(text: &str) -> VcfReader {
        let mut reader = VcfReader::from_reader(Cursor::new(text.as_bytes().to_vec()));
        reader.open().unwrap();
        reader
    }

    fn read_all(reader: &mut VcfReader) -> Result<Vec<VariantRecord>> {
        reader.read()?.collect()
    }

    #[test]
    fn test_header_parsed_on_open() {
        let reader = open(VCF);
        let header = reader.header();

        assert_eq!(header.file_format(), Some("VCFv4.2"));
        assert_eq!(reader.get_reference_genome(), "GRCh38");
        assert_eq!(reader.samples(), ["NA001", "NA002"]);
        assert_eq!(header.columns.len(), 11);

        assert_eq!(header.contigs.len(), 2);
        assert_eq!(header.contigs[0].assembly.as_deref(), Some("GRCh38"));
        assert!(header.contigs[0].md5.is_some());

        let dp = header.info_definition("DP").unwrap();
        assert_eq!(dp.get("Description").unwrap(), "Total depth, all samples");
        assert!(header.format_definition("GT").is_some());
    }

    #[test]
    fn test_read_variants() {
        let mut reader = open(VCF);
        let variants = read_all(&mut reader).unwrap();
        assert_eq!(variants.len(), 3);

        let v = &variants[0];
        assert_eq!(v.locus(), "chr1:100");
        assert_eq!(v.ids, vec!["rs1"]);
        assert_eq!(v.alternate_alleles, vec!["G", "T"]);
        assert_eq!(v.quality, Some(50.5));
        assert!(v.is_pass());
        assert_eq!(v.info_value("DP"), Some(Some("20")));
        assert_eq!(v.info_value("DB"), Some(None));
        assert_eq!(v.format, vec!["GT", "DP"]);
        assert_eq!(v.samples["NA002"]["GT"], "1|1");
        assert_eq!(v.samples["NA001"]["DP"], "10");

        let v = &variants[1];
        assert!(v.ids.is_empty());
        assert_eq!(v.quality, None);
        assert_eq!(v.filters, vec!["q10", "lowDP"]);
        assert!(v.info.is_empty());
        assert_eq!(v.samples.len(), 1);

        let v = &variants[2];
        assert!(v.format.is_empty());
        assert!(v.samples.is_empty());
    }

    #[test]
    fn test_chromosomes_and_coordinates() {
        let mut reader = open(VCF);
        assert_eq!(reader.get_chromosomes(), vec!["chr1", "chr2"]);
        assert!(reader.validate_coordinate("chr1", 248_956_422));
        assert!(!reader.validate_coordinate("chr1", 248_956_423));
        assert!(!reader.validate_coordinate("chr3", 5));

        read_all(&mut reader).unwrap();
        assert_eq!(reader.get_chromosomes(), vec!["chr1", "chr2", "chr3"]);
        assert!(reader.validate_coordinate("chr3", 5));
        assert_eq!(reader.get_chromosome_length("chr3"), None);
    }

    #[test]
    fn test_missing_column_line() {
        let mut reader =
            VcfReader::from_reader(Cursor::new(b"##fileformat=VCFv4.2\nchr1\t1\n".to_vec()));
        assert!(matches!(reader.open(), Err(Error::InvalidFormat { .. })));
        assert_eq!(reader.state(), ReaderState::Closed);

        let mut reader = VcfReader::from_reader(Cursor::new(Vec::new()));
        assert!(reader.open().is_err());
    }

    #[test]
    fn test_bad_column_line() {
        let mut reader = VcfReader::from_reader(Cursor::new(b"#CHROM\tPOS\tID\n".to_vec()));
        match reader.open() {
            Err(Error::InvalidFormat { line, .. }) => assert_eq!(line, Some(1)),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_too_few_columns() {
        let mut reader = open("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\nchr1\t1\t.\tA\tG\n");
        match read_all(&mut reader) {
            Err(Error::InvalidFormat { line, message }) => {
                assert_eq!(line, Some(2));
                assert!(message.contains("5 columns"));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_data_fields() {
        let reader = open("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n");
        assert!(reader.parse_line("chr1\t0\t.\tA\tG\t.\t.\t.").is_err());
        assert!(reader.parse_line("chr1\tx\t.\tA\tG\t.\t.\t.").is_err());
        assert!(reader.parse_line("chr1\t1\t.\t\tG\t.\t.\t.").is_err());
        assert!(reader.parse_line("chr1\t1\t.\tA\tG\tinf\t.\t.").is_err());
        assert!(reader.parse_line("chr1\t1\t.\tA\tG\tNaN\t.\t.").is_err());
        assert!(reader
            .parse_line("chr1\t1\t.\tA\tG\t.\t.\t.\tGT\t0/1\t1/1")
            .is_err());
        assert_eq!(reader.parse_line("#late").unwrap(), None);
        assert_eq!(reader.parse_line("").unwrap(), None);
    }

    #[test]
    fn test_parse_meta_line() {
        assert_eq!(
            parse_meta_line("source=caller v1").unwrap(),
            MetaLine::Unstructured {
                key: "source".to_string(),
                value: "caller v1".to_string()
            }
        );

        let meta = parse_meta_line("FILTER=<ID=q10,Description=\"Quality below 10\">").unwrap();
        assert_eq!(meta.key(), "FILTER");
        assert_eq!(meta.id(), Some("q10"));

        assert!(parse_meta_line("fileDate").is_err());
        assert!(parse_meta_line("INFO=<ID=DP,Number>").is_err());
    }

    #[test]
    fn test_blank_lines_inside_header() {
        let text = "##fileformat=VCFv4.2\n\n##contig=<ID=chr1,length=1000>\n\t\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\n\
                    chr1\t10\t.\tA\tG\t30\tPASS\t.\tGT\t0/1\n";
        let mut reader = open(text);
        assert_eq!(reader.samples(), ["NA001"]);
        assert_eq!(reader.header().contigs.len(), 1);
        assert_eq!(reader.header().line_count(), 3);

        let variants = read_all(&mut reader).unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].samples["NA001"]["GT"], "0/1");

        // Blank lines alone never make a header
        let mut reader = VcfReader::from_reader(Cursor::new(b"\n\n".to_vec()));
        assert!(matches!(reader.open(), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn test_contig_without_id_fails() {
        let mut reader = VcfReader::from_reader(Cursor::new(
            b"##contig=<length=10>\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n".to_vec(),
        ));
        assert!(reader.open().is_err());
    }
}
