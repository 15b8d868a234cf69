//! StarDict - Read-only access to StarDict dictionaries.
//!
//! This crate loads a dictionary from its `.ifo` metadata file and the
//! companion index, synonym and body files, and answers exact and
//! prefix (predictive) lookups with the article text.
//!
//! # Features
//!
//! - **Formats**: versions 2.4.2 and 3.0.0, 32 and 64 bit index offsets
//! - **Compression**: gzipped `.idx.gz`/`.syn.gz` and dictzip `.dict.dz` bodies
//! - **Synonyms**: `.syn` aliases resolve to the referenced headword's article
//! - **Compact index**: headwords are stored in an FST with prefix search
//! - **Article cache**: bounded, idle-expiring cache shared across threads
//! - **Thread-safe**: lookups may run concurrently from any thread
//!
//! # Quick Start
//!
//! ```ignore
//! use stardict::Dictionary;
//!
//! let dict = Dictionary::open("dicts/latin-francais.ifo")?;
//! println!("{} ({} headwords)", dict.name(), dict.len());
//!
//! // Exact, case-sensitive lookup
//! for entry in dict.lookup("testudo")? {
//!     println!("{} [{}]: {:?}", entry.word, entry.entry_type, entry.article);
//! }
//!
//! // Every headword starting with "test"
//! let matches = dict.lookup_predictive("test")?;
//!
//! dict.close();
//! ```
//!
//! # Companion Files
//!
//! For `name.ifo` the loader looks for, in order of preference:
//! 1. `name.idx.gz` or `name.idx` (required)
//! 2. `name.syn.gz` or `name.syn` (optional)
//! 3. `name.dict.dz` or `name.dict` (required)
//!
//! # Article Availability
//!
//! An article that cannot be read or is not valid UTF-8 is returned with
//! `article: None`. Other results of the same lookup are unaffected.

mod dictionary;
mod entry_type;
mod error;

pub mod body;
pub mod cache;
pub mod index;
pub mod info;

// Re-export core types
pub use entry_type::EntryType;
pub use error::{Error, Result};

// Re-export the dictionary facade
pub use dictionary::{Dictionary, Entry};

// Re-export metadata types
pub use info::{OffsetBits, StarDictInfo, Version};

// Re-export index and cache types for advanced usage
pub use cache::{ArticleCache, CacheConfig, CacheStats};
pub use index::{DictionaryIndex, IndexBuilder, IndexEntry};
