//! Error types for stardict-reader.

use thiserror::Error;

/// Error type for dictionary operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The first line of the `.ifo` file is not the StarDict magic line
    #[error("invalid header of .ifo file: {0:?}")]
    InvalidIfoHeader(String),

    /// A non-empty `.ifo` line without a `=` separator
    #[error("invalid format of .ifo file: {0:?}")]
    InvalidIfoLine(String),

    /// A required `.ifo` field is absent
    #[error("missing .ifo field: {0}")]
    MissingField(&'static str),

    /// An `.ifo` field could not be parsed
    #[error("invalid value for .ifo field {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Unsupported dictionary version
    #[error("unsupported dictionary version: {0:?}")]
    UnsupportedVersion(String),

    /// Unsupported `idxoffsetbits` value
    #[error("unsupported idxoffsetbits: {0} (only 32 and 64 are supported)")]
    UnsupportedOffsetBits(u32),

    /// Unknown entry type character
    #[error("unknown entry type: {0:?}")]
    UnknownEntryType(char),

    /// The type sequence is empty or absent
    #[error("dictionary has no sametypesequence")]
    MissingTypeSequence,

    /// Index or synonym file ended in the middle of a record
    #[error("truncated {file} record #{record}")]
    Truncated { file: &'static str, record: usize },

    /// Synonym record points outside the index key list
    #[error("synonym {alias:?} refers to index {index}, but the index holds {len} keys")]
    SynonymOutOfRange { alias: String, index: i64, len: usize },

    /// Malformed dictzip container
    #[error("invalid dictzip file: {0}")]
    InvalidDictZip(String),

    /// FST construction error
    #[error("index build error: {0}")]
    Fst(#[from] fst::Error),

    /// A required companion file is missing
    #[error("no {0} file could be found")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lookup on a closed dictionary
    #[error("dictionary is closed")]
    Closed,
}

impl Error {
    /// Whether this error reports malformed dictionary content.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, Error::NotFound(_) | Error::Io(_) | Error::Closed)
    }
}

/// Result type alias for dictionary operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_classification() {
        assert!(Error::MissingTypeSequence.is_format_error());
        assert!(Error::UnsupportedOffsetBits(48).is_format_error());
        assert!(Error::Truncated {
            file: "idx",
            record: 3
        }
        .is_format_error());
        assert!(!Error::Closed.is_format_error());
        assert!(!Error::NotFound(".idx".to_string()).is_format_error());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert!(!Error::from(io).is_format_error());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::UnknownEntryType('q').to_string(),
            "unknown entry type: 'q'"
        );
        assert_eq!(Error::Closed.to_string(), "dictionary is closed");
    }
}
