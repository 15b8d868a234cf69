//! Dictionary facade and loader.

use flate2::read::GzDecoder;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::body::{ArticleSource, DictFile, DictZipFile};
use crate::cache::{ArticleCache, CacheConfig, CacheStats};
use crate::index::{apply_synonyms, parse_idx, DictionaryIndex, IndexBuilder, IndexEntry};
use crate::info::{StarDictInfo, Version};
use crate::{EntryType, Error, Result};

/// One lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Headword as stored in the index
    pub word: String,
    /// How the article is encoded
    pub entry_type: EntryType,
    /// Article text, `None` if the body could not be read or decoded
    pub article: Option<Arc<str>>,
}

impl Entry {
    /// Whether the article text could be read.
    pub fn is_available(&self) -> bool {
        self.article.is_some()
    }
}

/// An open StarDict dictionary.
///
/// Lookups are safe to run concurrently from several threads. After
/// [`close`](Dictionary::close) every lookup fails with [`Error::Closed`].
///
/// # Example
///
/// ```ignore
/// use stardict::Dictionary;
///
/// let dict = Dictionary::open("dicts/latin-francais.ifo")?;
/// for entry in dict.lookup("testudo")? {
///     println!("{}: {}", entry.word, entry.article.as_deref().unwrap_or("?"));
/// }
/// dict.close();
/// ```
pub struct Dictionary {
    info: StarDictInfo,
    index: DictionaryIndex,
    cache: ArticleCache,
    source: RwLock<Option<Box<dyn ArticleSource>>>,
}

impl Dictionary {
    /// Open a dictionary from its `.ifo` path.
    ///
    /// The cache uses [`CacheConfig::for_compressed`] for `.dict.dz`
    /// bodies and [`CacheConfig::for_plain`] otherwise.
    pub fn open(ifo_path: impl AsRef<Path>) -> Result<Self> {
        Self::load(ifo_path.as_ref(), None)
    }

    /// Open a dictionary with a custom cache configuration.
    pub fn open_with_config(ifo_path: impl AsRef<Path>, config: CacheConfig) -> Result<Self> {
        Self::load(ifo_path.as_ref(), Some(config))
    }

    /// Assemble a dictionary from already-loaded parts.
    pub fn from_parts(
        info: StarDictInfo,
        index: DictionaryIndex,
        source: Box<dyn ArticleSource>,
        config: CacheConfig,
    ) -> Self {
        Self {
            info,
            index,
            cache: ArticleCache::new(config),
            source: RwLock::new(Some(source)),
        }
    }

    fn load(ifo_path: &Path, config: Option<CacheConfig>) -> Result<Self> {
        let info = StarDictInfo::load(ifo_path)?;
        let base = base_path(ifo_path);

        let idx_path = companion(&base, &[".idx.gz", ".idx"])
            .ok_or_else(|| Error::NotFound(format!("{}.idx[.gz]", base.display())))?;
        let syn_path = companion(&base, &[".syn.gz", ".syn"]);
        let index = load_index(&info, &idx_path, syn_path.as_deref())?;

        let dict_path = companion(&base, &[".dict.dz", ".dict"])
            .ok_or_else(|| Error::NotFound(format!("{}.dict[.dz]", base.display())))?;
        debug!("Using body file {:?}", dict_path);
        let source: Box<dyn ArticleSource> = if has_suffix(&dict_path, ".dz") {
            Box::new(DictZipFile::open(&dict_path)?)
        } else {
            Box::new(DictFile::open(&dict_path)?)
        };

        let config = config.unwrap_or_else(|| {
            if source.is_compressed() {
                CacheConfig::for_compressed()
            } else {
                CacheConfig::for_plain()
            }
        });

        info!(
            "Loaded dictionary {:?} ({}): {} headwords",
            info.book_name,
            info.version.as_str(),
            index.len()
        );

        Ok(Self::from_parts(info, index, source, config))
    }

    /// All articles stored under exactly `word`.
    ///
    /// Matching is case-sensitive; callers normalize `word` if needed.
    pub fn lookup(&self, word: &str) -> Result<Vec<Entry>> {
        self.ensure_open()?;
        self.resolve(self.index.lookup_exact(word))
    }

    /// All articles whose headword starts with `word`.
    pub fn lookup_predictive(&self, word: &str) -> Result<Vec<Entry>> {
        self.ensure_open()?;
        self.resolve(self.index.lookup_predictive(word))
    }

    /// Read the raw, uncached bytes of one article.
    ///
    /// Useful for binary entry types such as [`EntryType::Wav`].
    pub fn read_raw(&self, entry: &IndexEntry) -> Result<Vec<u8>> {
        let guard = self.source.read();
        let source = guard.as_ref().ok_or(Error::Closed)?;
        Ok(source.read_at(entry.offset, entry.length)?)
    }

    fn resolve(&self, hits: Vec<(String, IndexEntry)>) -> Result<Vec<Entry>> {
        let guard = self.source.read();
        let source = guard.as_ref().ok_or(Error::Closed)?;

        Ok(hits
            .into_iter()
            .map(|(word, entry)| Entry {
                article: self.cache.get(&entry, source.as_ref()),
                entry_type: entry.entry_type,
                word,
            })
            .collect())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.source.read().is_none() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Dictionary metadata.
    pub fn info(&self) -> &StarDictInfo {
        &self.info
    }

    /// Human readable dictionary name.
    pub fn name(&self) -> &str {
        &self.info.book_name
    }

    /// Dictionary format version.
    pub fn version(&self) -> Version {
        self.info.version
    }

    /// The headword index.
    pub fn index(&self) -> &DictionaryIndex {
        &self.index
    }

    /// Number of distinct headwords, synonyms included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the dictionary has no headwords.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Release the body file. Calling this more than once is a no-op.
    pub fn close(&self) {
        if self.source.write().take().is_some() {
            self.cache.clear();
            debug!("Closed dictionary {:?}", self.info.book_name);
        }
    }

    /// Whether [`close`](Dictionary::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.source.read().is_none()
    }
}

impl std::fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dictionary")
            .field("name", &self.info.book_name)
            .field("index", &self.index)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Parse the `.idx` file and optional `.syn` file into an index.
fn load_index(info: &StarDictInfo, idx_path: &Path, syn_path: Option<&Path>) -> Result<DictionaryIndex> {
    let mut builder = IndexBuilder::new();

    debug!("Reading index {:?}", idx_path);
    let records = parse_idx(
        open_maybe_gzip(idx_path)?,
        info.offset_bits,
        info.type_sequence(),
        &mut builder,
    )?;
    if records != info.word_count as usize {
        warn!(
            "{:?} declares wordcount={} but the index holds {} records",
            info.book_name, info.word_count, records
        );
    }

    if let Some(syn_path) = syn_path {
        debug!("Reading synonyms {:?}", syn_path);
        let synonyms = apply_synonyms(open_maybe_gzip(syn_path)?, &mut builder)?;
        if let Some(expected) = info.syn_word_count {
            if synonyms != expected as usize {
                warn!(
                    "{:?} declares synwordcount={} but the synonym file holds {} records",
                    info.book_name, expected, synonyms
                );
            }
        }
    }

    builder.build()
}

fn open_maybe_gzip(path: &Path) -> Result<Box<dyn Read>> {
    let file = BufReader::new(File::open(path)?);
    if has_suffix(path, ".gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Strip a trailing `.ifo` from the path.
fn base_path(ifo_path: &Path) -> PathBuf {
    if has_suffix(ifo_path, ".ifo") {
        ifo_path.with_extension("")
    } else {
        ifo_path.to_path_buf()
    }
}

/// First existing `base + suffix` file.
fn companion(base: &Path, suffixes: &[&str]) -> Option<PathBuf> {
    suffixes
        .iter()
        .map(|suffix| {
            let mut name = OsString::from(base.as_os_str());
            name.push(suffix);
            PathBuf::from(name)
        })
        .find(|path| path.is_file())
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.to_string_lossy().ends_with(suffix)
}
