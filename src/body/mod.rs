//! Article body readers for `.dict` and `.dict.dz` files.

mod dictzip;
mod plain;

use std::io;

pub use dictzip::DictZipFile;
pub use plain::DictFile;

/// Random access to article bytes.
///
/// Implementations own their file handle and must make each
/// `read_at` call atomic with respect to concurrent calls.
pub trait ArticleSource: Send + Sync {
    /// Read exactly `length` bytes starting at `offset` of the
    /// uncompressed body.
    fn read_at(&self, offset: u64, length: u32) -> io::Result<Vec<u8>>;

    /// Whether the body is stored compressed.
    fn is_compressed(&self) -> bool {
        false
    }
}

impl<T: ArticleSource + ?Sized> ArticleSource for Box<T> {
    fn read_at(&self, offset: u64, length: u32) -> io::Result<Vec<u8>> {
        (**self).read_at(offset, length)
    }

    fn is_compressed(&self) -> bool {
        (**self).is_compressed()
    }
}

/// In-memory body, mainly for tests and embedded dictionaries.
impl ArticleSource for Vec<u8> {
    fn read_at(&self, offset: u64, length: u32) -> io::Result<Vec<u8>> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;
        let end = start
            .checked_add(length as usize)
            .filter(|end| *end <= self.len())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "article beyond end of body")
            })?;
        Ok(self[start..end].to_vec())
    }
}
