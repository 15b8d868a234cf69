//! Streaming `.idx` parser.

use byteorder::{BigEndian, ReadBytesExt};
use log::debug;
use std::io::{self, BufRead, BufReader, Read};

use super::{IndexBuilder, IndexEntry};
use crate::info::OffsetBits;
use crate::{EntryType, Error, Result};

/// Iterator over `(key, IndexEntry)` records of an `.idx` stream.
///
/// The stream must already be decompressed. Record `i` gets the type
/// `types[i % types.len()]`. The iterator stops after the first error.
pub struct IdxReader<R> {
    reader: BufReader<R>,
    offset_bits: OffsetBits,
    types: Vec<EntryType>,
    record: usize,
    buf: Vec<u8>,
    done: bool,
}

impl<R: Read> IdxReader<R> {
    /// Create a reader. Fails if `types` is empty.
    pub fn new(reader: R, offset_bits: OffsetBits, types: &[EntryType]) -> Result<Self> {
        if types.is_empty() {
            return Err(Error::MissingTypeSequence);
        }
        Ok(Self {
            reader: BufReader::new(reader),
            offset_bits,
            types: types.to_vec(),
            record: 0,
            buf: Vec::with_capacity(64),
            done: false,
        })
    }

    /// Number of records read so far.
    pub fn records_read(&self) -> usize {
        self.record
    }

    fn read_record(&mut self) -> Result<Option<(String, IndexEntry)>> {
        let key = match read_key(&mut self.reader, &mut self.buf, "idx", self.record)? {
            Some(key) => key,
            None => return Ok(None),
        };

        let offset = match self.offset_bits {
            OffsetBits::Bits32 => self.reader.read_u32::<BigEndian>().map(u64::from),
            OffsetBits::Bits64 => self.reader.read_u64::<BigEndian>(),
        }
        .map_err(|e| truncated(e, "idx", self.record))?;
        let length = self
            .reader
            .read_u32::<BigEndian>()
            .map_err(|e| truncated(e, "idx", self.record))?;

        let entry_type = self.types[self.record % self.types.len()];
        self.record += 1;

        Ok(Some((key, IndexEntry::new(offset, length, entry_type))))
    }
}

impl<R: Read> Iterator for IdxReader<R> {
    type Item = Result<(String, IndexEntry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse a whole `.idx` stream into `builder`.
///
/// Returns the number of records read.
pub fn parse_idx<R: Read>(
    reader: R,
    offset_bits: OffsetBits,
    types: &[EntryType],
    builder: &mut IndexBuilder,
) -> Result<usize> {
    let mut records = IdxReader::new(reader, offset_bits, types)?;
    for record in records.by_ref() {
        let (key, entry) = record?;
        builder.insert(key, entry);
    }
    debug!(
        "Parsed {} idx records ({}-bit offsets)",
        records.records_read(),
        offset_bits.bits()
    );
    Ok(records.records_read())
}

/// Read one NUL-terminated key.
///
/// Returns `None` on a clean end of stream. Bytes without a closing NUL
/// are a truncated record. Invalid UTF-8 is replaced with U+FFFD.
pub(super) fn read_key<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    file: &'static str,
    record: usize,
) -> Result<Option<String>> {
    buf.clear();
    let n = reader.read_until(0, buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.pop() != Some(0) {
        return Err(Error::Truncated { file, record });
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

pub(super) fn truncated(err: io::Error, file: &'static str, record: usize) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::Truncated { file, record }
    } else {
        Error::Io(err)
    }
}
