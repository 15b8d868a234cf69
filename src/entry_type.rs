//! Article content type tags.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// EntryType describes how the body of an article is encoded.
///
/// Each variant corresponds to one character of the `.ifo`
/// `sametypesequence` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Word's pure text meaning
    Mean,
    /// English phonetic string
    Phonetic,
    /// Pango text markup
    Pango,
    /// XDXF markup
    Xdxf,
    /// Chinese YinBiao or Japanese KANA
    Yinbiao,
    /// KingSoft PowerWord XML data
    Kingsoft,
    /// MediaWiki markup
    MediaWiki,
    /// HTML codes
    Html,
    /// WordNet data
    WordNet,
    /// Resource file list
    Resource,
    /// WAVE file
    Wav,
    /// Picture image
    Picture,
    /// Reserved for experimental extensions
    Experimental,
}

impl EntryType {
    /// All entry types, in tag order.
    pub const ALL: [EntryType; 13] = [
        EntryType::Mean,
        EntryType::Phonetic,
        EntryType::Pango,
        EntryType::Xdxf,
        EntryType::Yinbiao,
        EntryType::Kingsoft,
        EntryType::MediaWiki,
        EntryType::Html,
        EntryType::WordNet,
        EntryType::Resource,
        EntryType::Wav,
        EntryType::Picture,
        EntryType::Experimental,
    ];

    /// Convert from a type character. Matching is case-sensitive.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'm' => Some(EntryType::Mean),
            't' => Some(EntryType::Phonetic),
            'g' => Some(EntryType::Pango),
            'x' => Some(EntryType::Xdxf),
            'y' => Some(EntryType::Yinbiao),
            'k' => Some(EntryType::Kingsoft),
            'w' => Some(EntryType::MediaWiki),
            'h' => Some(EntryType::Html),
            'n' => Some(EntryType::WordNet),
            'r' => Some(EntryType::Resource),
            'W' => Some(EntryType::Wav),
            'P' => Some(EntryType::Picture),
            'X' => Some(EntryType::Experimental),
            _ => None,
        }
    }

    /// Get the type character.
    pub fn as_char(self) -> char {
        match self {
            EntryType::Mean => 'm',
            EntryType::Phonetic => 't',
            EntryType::Pango => 'g',
            EntryType::Xdxf => 'x',
            EntryType::Yinbiao => 'y',
            EntryType::Kingsoft => 'k',
            EntryType::MediaWiki => 'w',
            EntryType::Html => 'h',
            EntryType::WordNet => 'n',
            EntryType::Resource => 'r',
            EntryType::Wav => 'W',
            EntryType::Picture => 'P',
            EntryType::Experimental => 'X',
        }
    }

    /// Whether the article body is text rather than binary media.
    pub fn is_textual(self) -> bool {
        !matches!(self, EntryType::Wav | EntryType::Picture)
    }

    /// Parse a whole `sametypesequence` value.
    ///
    /// Fails on an empty sequence or on any unknown character.
    pub fn parse_sequence(sequence: &str) -> Result<Vec<Self>> {
        if sequence.is_empty() {
            return Err(Error::MissingTypeSequence);
        }
        sequence
            .chars()
            .map(|c| Self::from_char(c).ok_or(Error::UnknownEntryType(c)))
            .collect()
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<char> for EntryType {
    type Error = Error;

    fn try_from(c: char) -> Result<Self> {
        Self::from_char(c).ok_or(Error::UnknownEntryType(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_char_roundtrip() {
        for entry_type in EntryType::ALL {
            assert_eq!(EntryType::from_char(entry_type.as_char()), Some(entry_type));
        }
    }

    #[test]
    fn test_entry_type_is_case_sensitive() {
        assert_eq!(EntryType::from_char('w'), Some(EntryType::MediaWiki));
        assert_eq!(EntryType::from_char('W'), Some(EntryType::Wav));
        assert_eq!(EntryType::from_char('x'), Some(EntryType::Xdxf));
        assert_eq!(EntryType::from_char('X'), Some(EntryType::Experimental));
        assert_eq!(EntryType::from_char('M'), None);
        assert_eq!(EntryType::from_char('z'), None);
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(
            EntryType::parse_sequence("tm").unwrap(),
            vec![EntryType::Phonetic, EntryType::Mean]
        );
        assert!(matches!(
            EntryType::parse_sequence(""),
            Err(Error::MissingTypeSequence)
        ));
        assert!(matches!(
            EntryType::parse_sequence("mq"),
            Err(Error::UnknownEntryType('q'))
        ));
    }

    #[test]
    fn test_entry_type_display() {
        assert_eq!(EntryType::Html.to_string(), "h");
        assert!(EntryType::Html.is_textual());
        assert!(!EntryType::Picture.is_textual());
    }
}
