//! Headword index: binary `.idx`/`.syn` parsing and the in-memory lookup structure.
//!
//! # Record Layout
//!
//! ```text
//! .idx record                                .syn record
//! +---------------------+                    +---------------------+
//! | key bytes ... | NUL |                    | alias bytes . | NUL |
//! +---------------------+                    +---------------------+
//! | offset  u32|u64 BE  |                    | ref index  i32 BE   |
//! +---------------------+                    +---------------------+
//! | length  u32 BE      |
//! +---------------------+
//! ```
//!
//! Records repeat until end of file. A `.syn` ref index is the zero-based
//! position of a record in the `.idx` file.

mod data;
mod parser;
mod synonym;

use std::hash::{Hash, Hasher};

use crate::EntryType;

pub use data::{DictionaryIndex, IndexBuilder};
pub use parser::{parse_idx, IdxReader};
pub use synonym::{apply_synonyms, SynReader};

/// Location of one article in the body file.
///
/// Equality and hashing only consider `(offset, length)`: two entries
/// pointing at the same byte range are the same record.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry {
    pub offset: u64,
    pub length: u32,
    pub entry_type: EntryType,
}

impl IndexEntry {
    /// Create a new index entry.
    pub fn new(offset: u64, length: u32, entry_type: EntryType) -> Self {
        Self {
            offset,
            length,
            entry_type,
        }
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.length == other.length
    }
}

impl Eq for IndexEntry {}

impl Hash for IndexEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset.hash(state);
        self.length.hash(state);
    }
}
