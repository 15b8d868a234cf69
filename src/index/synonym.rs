//! Streaming `.syn` parser.

use byteorder::{BigEndian, ReadBytesExt};
use log::debug;
use std::io::{BufReader, Read};

use super::parser::{read_key, truncated};
use super::IndexBuilder;
use crate::Result;

/// Iterator over `(alias, ref_index)` records of a `.syn` stream.
pub struct SynReader<R> {
    reader: BufReader<R>,
    record: usize,
    buf: Vec<u8>,
    done: bool,
}

impl<R: Read> SynReader<R> {
    /// Create a reader over a decompressed `.syn` stream.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            record: 0,
            buf: Vec::with_capacity(64),
            done: false,
        }
    }

    fn read_record(&mut self) -> Result<Option<(String, i32)>> {
        let alias = match read_key(&mut self.reader, &mut self.buf, "syn", self.record)? {
            Some(alias) => alias,
            None => return Ok(None),
        };
        let index = self
            .reader
            .read_i32::<BigEndian>()
            .map_err(|e| truncated(e, "syn", self.record))?;
        self.record += 1;
        Ok(Some((alias, index)))
    }
}

impl<R: Read> Iterator for SynReader<R> {
    type Item = Result<(String, i32)>;

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

/// Apply every record of a `.syn` stream to `builder`.
///
/// Each alias receives the first entry of the `.idx` key it refers to.
/// Returns the number of synonyms added.
pub fn apply_synonyms<R: Read>(reader: R, builder: &mut IndexBuilder) -> Result<usize> {
    let mut count = 0;
    for record in SynReader::new(reader) {
        let (alias, index) = record?;
        builder.add_synonym(alias, i64::from(index))?;
        count += 1;
    }
    debug!("Applied {} synonyms", count);
    Ok(count)
}
