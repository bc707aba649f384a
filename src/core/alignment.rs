use noodles::sam::alignment::record::Flags as SamFlags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub use noodles::sam::alignment::record::cigar::{op::Kind as CigarKind, Op as CigarOp};

/// SAM FLAG bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flags(pub u16);

impl Flags {
    pub const PAIRED: u16 = 0x1;
    pub const PROPER_PAIR: u16 = 0x2;
    pub const UNMAPPED: u16 = 0x4;
    pub const MATE_UNMAPPED: u16 = 0x8;
    pub const REVERSE: u16 = 0x10;
    pub const MATE_REVERSE: u16 = 0x20;
    pub const FIRST_SEGMENT: u16 = 0x40;
    pub const LAST_SEGMENT: u16 = 0x80;
    pub const SECONDARY: u16 = 0x100;
    pub const QC_FAIL: u16 = 0x200;
    pub const DUPLICATE: u16 = 0x400;
    pub const SUPPLEMENTARY: u16 = 0x800;

    pub fn bits(self) -> u16 {
        self.0
    }

    /// The same bits as noodles flags
    pub fn to_noodles(self) -> SamFlags {
        SamFlags::from(self.0)
    }

    /// True when every bit of `mask` is set
    pub fn contains(self, mask: u16) -> bool {
        self.0 & mask == mask
    }

    pub fn is_unmapped(self) -> bool {
        self.to_noodles().is_unmapped()
    }

    pub fn is_reverse(self) -> bool {
        self.to_noodles().is_reverse_complemented()
    }

    /// Secondary or supplementary
    pub fn is_non_primary(self) -> bool {
        let flags = self.to_noodles();
        flags.is_secondary() || flags.is_supplementary()
    }
}

impl From<SamFlags> for Flags {
    fn from(flags: SamFlags) -> Self {
        Self(u16::from(flags))
    }
}

fn kind_from_symbol(symbol: char) -> Option<CigarKind> {
    Some(match symbol {
        'M' => CigarKind::Match,
        'I' => CigarKind::Insertion,
        'D' => CigarKind::Deletion,
        'N' => CigarKind::Skip,
        'S' => CigarKind::SoftClip,
        'H' => CigarKind::HardClip,
        'P' => CigarKind::Pad,
        '=' => CigarKind::SequenceMatch,
        'X' => CigarKind::SequenceMismatch,
        _ => return None,
    })
}

/// SAM text symbol of a CIGAR operation kind
pub fn kind_symbol(kind: CigarKind) -> char {
    match kind {
        CigarKind::Match => 'M',
        CigarKind::Insertion => 'I',
        CigarKind::Deletion => 'D',
        CigarKind::Skip => 'N',
        CigarKind::SoftClip => 'S',
        CigarKind::HardClip => 'H',
        CigarKind::Pad => 'P',
        CigarKind::SequenceMatch => '=',
        CigarKind::SequenceMismatch => 'X',
    }
}

/// Parsed CIGAR string. `*` is represented by an empty operation list.
///
/// Serialized as its SAM text form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cigar(pub Vec<CigarOp>);

impl Cigar {
    pub fn ops(&self) -> &[CigarOp] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of reference bases spanned (M, D, N, =, X)
    pub fn reference_length(&self) -> u64 {
        self.0
            .iter()
            .filter(|op| op.kind().consumes_reference())
            .map(|op| op.len() as u64)
            .sum()
    }
}

impl FromStr for Cigar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "*" {
            return Ok(Self::default());
        }
        if s.is_empty() {
            return Err(Error::format("Empty CIGAR string"));
        }

        let mut ops = Vec::new();
        let mut start = 0;
        for (i, c) in s.char_indices() {
            if c.is_ascii_digit() {
                continue;
            }
            let kind = kind_from_symbol(c)
                .ok_or_else(|| Error::format(format!("Invalid CIGAR operation '{c}' in {s}")))?;
            let len: usize = s[start..i]
                .parse()
                .map_err(|_| Error::format(format!("Missing length before '{c}' in CIGAR {s}")))?;
            ops.push(CigarOp::new(kind, len));
            start = i + c.len_utf8();
        }

        if start != s.len() {
            return Err(Error::format(format!(
                "CIGAR {s} ends with a length but no operation"
            )));
        }

        Ok(Self(ops))
    }
}

impl TryFrom<String> for Cigar {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Cigar> for String {
    fn from(cigar: Cigar) -> Self {
        cigar.to_string()
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "*");
        }
        for op in &self.0 {
            write!(f, "{}{}", op.len(), kind_symbol(op.kind()))?;
        }
        Ok(())
    }
}

/// A single SAM alignment line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    pub qname: String,
    pub flags: Flags,
    /// RNAME, `*` when unplaced
    pub reference_name: String,
    /// 1-based leftmost position, 0 when unavailable
    pub position: u64,
    pub mapping_quality: u8,
    pub cigar: Cigar,
    pub mate_reference_name: String,
    pub mate_position: u64,
    pub template_length: i64,
    pub sequence: String,
    /// Raw QUAL column, `*` when absent
    pub quality: String,
    /// Optional `TAG:TYPE:VALUE` fields, unparsed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl AlignmentRecord {
    /// Placed on a reference sequence with a usable position
    pub fn is_placed(&self) -> bool {
        self.reference_name != "*" && self.position > 0
    }

    /// Number of reference bases covered by this alignment
    pub fn reference_length(&self) -> u64 {
        self.cigar.reference_length()
    }

    /// 1-based inclusive end. Equals `position` when nothing is covered.
    pub fn end(&self) -> u64 {
        match self.reference_length() {
            0 => self.position,
            len => self.position + len - 1,
        }
    }

    /// Value of an optional tag such as `NM`, without its type code
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.iter().find_map(|field| {
            let mut parts = field.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(tag), Some(_), Some(value)) if tag == name => Some(value),
                _ => None,
            }
        })
    }
}
