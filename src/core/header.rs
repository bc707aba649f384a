use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::contig::Contig;

/// Ordered `KEY:VALUE` attributes of one header line
pub type HeaderFields = IndexMap<String, String>;

/// Header of a SAM file.
///
/// Groups are keyed by their two-letter tag without the `@` (`HD`, `SQ`,
/// `RG`, `PG`, ...). `@CO` lines carry free text and are kept apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamHeader {
    pub groups: IndexMap<String, Vec<HeaderFields>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,

    /// Reference dictionary built from `@SQ` lines
    pub contigs: Vec<Contig>,
}

impl SamHeader {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.comments.is_empty()
    }

    /// All lines of a group, empty if the tag never appeared
    pub fn get(&self, tag: &str) -> &[HeaderFields] {
        self.groups.get(tag).map_or(&[], Vec::as_slice)
    }

    fn hd_field(&self, key: &str) -> Option<&str> {
        self.get("HD").first()?.get(key).map(String::as_str)
    }

    /// `@HD VN`
    pub fn version(&self) -> Option<&str> {
        self.hd_field("VN")
    }

    /// `@HD SO`
    pub fn sort_order(&self) -> Option<&str> {
        self.hd_field("SO")
    }

    pub fn read_groups(&self) -> &[HeaderFields] {
        self.get("RG")
    }

    pub fn programs(&self) -> &[HeaderFields] {
        self.get("PG")
    }

    /// First assembly named by an `@SQ AS` tag
    pub fn reference_genome(&self) -> Option<&str> {
        self.contigs.iter().find_map(|c| c.assembly.as_deref())
    }

    pub(crate) fn push_group(&mut self, tag: &str, fields: HeaderFields) {
        self.groups.entry(tag.to_string()).or_default().push(fields);
    }
}

/// One `##` line of a VCF header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetaLine {
    /// `##key=value`
    Unstructured { key: String, value: String },
    /// `##key=<ID=...,...>`
    Structured { key: String, fields: HeaderFields },
}

impl MetaLine {
    pub fn key(&self) -> &str {
        match self {
            Self::Unstructured { key, .. } | Self::Structured { key, .. } => key,
        }
    }

    /// `ID` of a structured line
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Structured { fields, .. } => fields.get("ID").map(String::as_str),
            Self::Unstructured { .. } => None,
        }
    }
}

/// Fixed columns every VCF `#CHROM` line starts with
pub const VCF_FIXED_COLUMNS: [&str; 8] =
    ["CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO"];

/// Header of a VCF file: meta-lines plus the `#CHROM` column line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcfHeader {
    pub meta: Vec<MetaLine>,

    /// Column names from the `#CHROM` line, without the leading `#`
    pub columns: Vec<String>,

    /// Sample names (columns after FORMAT)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<String>,

    /// Reference dictionary built from `##contig` lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contigs: Vec<Contig>,
}

impl VcfHeader {
    /// All meta-lines with the given key, in file order
    pub fn get<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a MetaLine> + 'a {
        self.meta.iter().filter(move |m| m.key() == key)
    }

    /// Number of header lines: every meta-line plus the `#CHROM` line
    pub fn line_count(&self) -> usize {
        self.meta.len() + usize::from(!self.columns.is_empty())
    }

    fn unstructured(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .filter(|m| m.key() == key)
            .find_map(|m| match m {
                MetaLine::Unstructured { value, .. } => Some(value.as_str()),
                MetaLine::Structured { .. } => None,
            })
    }

    /// `##fileformat`
    pub fn file_format(&self) -> Option<&str> {
        self.unstructured("fileformat")
    }

    /// `##reference`
    pub fn reference(&self) -> Option<&str> {
        self.unstructured("reference")
    }

    /// Structured `##INFO` definition for an ID
    pub fn info_definition(&self, id: &str) -> Option<&HeaderFields> {
        self.structured("INFO", id)
    }

    /// Structured `##FORMAT` definition for an ID
    pub fn format_definition(&self, id: &str) -> Option<&HeaderFields> {
        self.structured("FORMAT", id)
    }

    fn structured(&self, key: &str, id: &str) -> Option<&HeaderFields> {
        self.meta
            .iter()
            .filter(|m| m.key() == key)
            .find_map(|m| match m {
                MetaLine::Structured { fields, .. } if m.id() == Some(id) => Some(fields),
                _ => None,
            })
    }

    pub fn has_sample(&self, name: &str) -> bool {
        self.samples.iter().any(|s| s == name)
    }
}
