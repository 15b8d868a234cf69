//! Uncompressed `.dict` reader.

use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use super::ArticleSource;

/// Plain `.dict` file with a mutex-guarded handle.
pub struct DictFile {
    file: Mutex<File>,
    len: u64,
}

impl DictFile {
    /// Open a `.dict` file.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file: Mutex::new(file),
            len,
        })
    }

    /// Size of the body in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl ArticleSource for DictFile {
    fn read_at(&self, offset: u64, length: u32) -> io::Result<Vec<u8>> {
        offset
            .checked_add(u64::from(length))
            .filter(|end| *end <= self.len)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "article beyond end of body")
            })?;

        let mut buf = vec![0u8; length as usize];
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}
