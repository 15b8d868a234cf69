//! `.ifo` metadata parsing.
//!
//! The `.ifo` file is a small UTF-8 text file:
//!
//! ```text
//! StarDict's dict ifo file
//! version=3.0.0
//! bookname=Latin-French
//! wordcount=10451
//! idxoffsetbits=64
//! sametypesequence=m
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::{EntryType, Error, Result};

/// Magic first line of every `.ifo` file.
pub const IFO_MAGIC: &str = "StarDict's dict ifo file";

/// Supported StarDict format versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    #[serde(rename = "2.4.2")]
    V2_4_2,
    #[serde(rename = "3.0.0")]
    V3_0_0,
}

impl Version {
    /// Parse a version string. Only `2.4.2` and `3.0.0` are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "2.4.2" => Some(Version::V2_4_2),
            "3.0.0" => Some(Version::V3_0_0),
            _ => None,
        }
    }

    /// Get the version string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V2_4_2 => "2.4.2",
            Version::V3_0_0 => "3.0.0",
        }
    }
}

/// Width of the body offset field in `.idx` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OffsetBits {
    #[default]
    #[serde(rename = "32")]
    Bits32,
    #[serde(rename = "64")]
    Bits64,
}

impl OffsetBits {
    /// Convert from an `idxoffsetbits` value.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            32 => Ok(OffsetBits::Bits32),
            64 => Ok(OffsetBits::Bits64),
            other => Err(Error::UnsupportedOffsetBits(other)),
        }
    }

    /// Number of bits in the offset field.
    pub fn bits(self) -> u32 {
        match self {
            OffsetBits::Bits32 => 32,
            OffsetBits::Bits64 => 64,
        }
    }
}

/// Dictionary metadata read from the `.ifo` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "InfoRecord")]
pub struct StarDictInfo {
    pub book_name: String,
    pub version: Version,
    pub word_count: u32,
    pub syn_word_count: Option<u32>,
    pub idx_file_size: Option<u64>,
    pub offset_bits: OffsetBits,
    pub same_type_sequence: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    #[serde(skip)]
    types: Vec<EntryType>,
}

/// Serialized form of [`StarDictInfo`].
#[derive(Deserialize)]
struct InfoRecord {
    book_name: String,
    version: Version,
    word_count: u32,
    syn_word_count: Option<u32>,
    idx_file_size: Option<u64>,
    #[serde(default)]
    offset_bits: OffsetBits,
    same_type_sequence: Option<String>,
    author: Option<String>,
    email: Option<String>,
    website: Option<String>,
    description: Option<String>,
    date: Option<String>,
}

impl TryFrom<InfoRecord> for StarDictInfo {
    type Error = Error;

    fn try_from(record: InfoRecord) -> Result<Self> {
        let types = parse_types(record.same_type_sequence.as_deref())?;
        Ok(Self {
            book_name: record.book_name,
            version: record.version,
            word_count: record.word_count,
            syn_word_count: record.syn_word_count,
            idx_file_size: record.idx_file_size,
            offset_bits: record.offset_bits,
            same_type_sequence: record.same_type_sequence,
            author: record.author,
            email: record.email,
            website: record.website,
            description: record.description,
            date: record.date,
            types,
        })
    }
}

fn parse_types(sequence: Option<&str>) -> Result<Vec<EntryType>> {
    match sequence {
        Some(seq) => EntryType::parse_sequence(seq),
        None => Ok(Vec::new()),
    }
}

impl StarDictInfo {
    /// Load metadata from an `.ifo` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Parse metadata from a reader over `.ifo` text.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let fields = parse_fields(reader)?;
        Self::from_fields(&fields)
    }

    /// Build metadata from already-split `key=value` fields.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| fields.get(key).map(|s| s.as_str());
        let owned = |key: &str| get(key).map(str::to_string);

        let version_str = get("version").ok_or(Error::MissingField("version"))?;
        let version = Version::parse(version_str)
            .ok_or_else(|| Error::UnsupportedVersion(version_str.to_string()))?;

        let book_name = owned("bookname").ok_or(Error::MissingField("bookname"))?;
        let word_count = parse_number(
            "wordcount",
            get("wordcount").ok_or(Error::MissingField("wordcount"))?,
        )?;
        let syn_word_count = get("synwordcount")
            .map(|v| parse_number("synwordcount", v))
            .transpose()?;
        let idx_file_size = get("idxfilesize")
            .map(|v| parse_number("idxfilesize", v))
            .transpose()?;

        // idxoffsetbits only exists since 3.0.0
        let offset_bits = match (version, get("idxoffsetbits")) {
            (Version::V3_0_0, Some(bits)) => {
                OffsetBits::from_bits(parse_number("idxoffsetbits", bits)?)?
            }
            _ => OffsetBits::Bits32,
        };

        let same_type_sequence = owned("sametypesequence");
        let types = parse_types(same_type_sequence.as_deref())?;

        Ok(Self {
            book_name,
            version,
            word_count,
            syn_word_count,
            idx_file_size,
            offset_bits,
            same_type_sequence,
            author: owned("author"),
            email: owned("email"),
            website: owned("website"),
            description: owned("description"),
            date: owned("date"),
            types,
        })
    }

    /// Parsed `sametypesequence`; empty when the field is absent.
    pub fn type_sequence(&self) -> &[EntryType] {
        &self.types
    }

    /// Whether the dictionary declares a synonym file.
    pub fn has_synonyms(&self) -> bool {
        self.syn_word_count.is_some()
    }
}

/// Split `.ifo` text into its `key=value` fields.
///
/// The first line must be the StarDict magic line. Blank lines are skipped;
/// any other line without `=` is rejected. Later keys overwrite earlier ones.
pub fn parse_fields<R: Read>(reader: R) -> Result<HashMap<String, String>> {
    let mut lines = BufReader::new(reader).lines();

    let first = lines.next().transpose()?.unwrap_or_default();
    let first = first.trim_start_matches('\u{feff}').trim_end_matches('\r');
    if first != IFO_MAGIC {
        return Err(Error::InvalidIfoHeader(first.to_string()));
    }

    let mut fields = HashMap::new();
    for line in lines {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| Error::InvalidIfoLine(line.to_string()))?;
        fields.insert(key.to_string(), value.to_string());
    }

    Ok(fields)
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::InvalidField {
        field,
        value: value.to_string(),
    })
}
