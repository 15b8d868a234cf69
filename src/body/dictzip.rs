//! Random-access reader for dictzip (`.dict.dz`) bodies.
//!
//! A dictzip file is a gzip member whose deflate stream is flushed at
//! fixed uncompressed intervals ("chunks"). The sizes of the compressed
//! chunks live in an `RA` subfield of the gzip extra header:
//!
//! ```text
//! +----+----+----+-----+-------+-----+----+
//! | 1f | 8b | CM | FLG | MTIME | XFL | OS |   10 bytes
//! +----+----+----+-----+-------+-----+----+
//! | XLEN (u16 LE) | 'R' 'A' | LEN | VER=1 | CHLEN | CHCNT | size[0..CHCNT] |
//! +---------------+---------+-----+-------+-------+-------+----------------+
//! | FNAME\0 | FCOMMENT\0 | FHCRC |          optional
//! +------------------------------+
//! | chunk 0 | chunk 1 | ...      |          raw deflate
//! +------------------------------+
//! ```
//!
//! Reading a byte range only inflates the chunks that cover it.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::{Decompress, FlushDecompress, Status};
use log::debug;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::ArticleSource;
use crate::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const CM_DEFLATE: u8 = 8;

const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;

/// Parsed dictzip chunk table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkTable {
    /// Uncompressed size of every chunk but the last
    pub chunk_len: u32,
    /// File offset of each compressed chunk, plus one trailing end offset
    pub offsets: Vec<u64>,
}

impl ChunkTable {
    /// Number of chunks.
    pub fn chunk_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Parse the gzip header of a dictzip stream.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut fixed = [0u8; 10];
        reader.read_exact(&mut fixed).map_err(header_error)?;
        if fixed[0..2] != GZIP_MAGIC {
            return Err(Error::InvalidDictZip("not a gzip file".to_string()));
        }
        if fixed[2] != CM_DEFLATE {
            return Err(Error::InvalidDictZip(format!(
                "unsupported compression method {}",
                fixed[2]
            )));
        }
        let flags = fixed[3];
        if flags & FEXTRA == 0 {
            return Err(Error::InvalidDictZip(
                "missing extra field, file is plain gzip".to_string(),
            ));
        }

        let xlen = reader.read_u16::<LittleEndian>().map_err(header_error)?;
        let mut extra = vec![0u8; xlen as usize];
        reader.read_exact(&mut extra).map_err(header_error)?;
        let mut pos = 10 + 2 + u64::from(xlen);

        let (chunk_len, sizes) = find_random_access_field(&extra)?;

        if flags & FNAME != 0 {
            pos += skip_zero_terminated(reader)?;
        }
        if flags & FCOMMENT != 0 {
            pos += skip_zero_terminated(reader)?;
        }
        if flags & FHCRC != 0 {
            reader.read_u16::<LittleEndian>().map_err(header_error)?;
            pos += 2;
        }

        let mut offsets = Vec::with_capacity(sizes.len() + 1);
        offsets.push(pos);
        for size in sizes {
            pos += u64::from(size);
            offsets.push(pos);
        }

        Ok(Self {
            chunk_len: u32::from(chunk_len),
            offsets,
        })
    }
}

/// Locate the `RA` subfield and decode its chunk table.
fn find_random_access_field(mut extra: &[u8]) -> Result<(u16, Vec<u16>)> {
    while extra.len() >= 4 {
        let id = [extra[0], extra[1]];
        let len = u16::from_le_bytes([extra[2], extra[3]]) as usize;
        let body = extra
            .get(4..4 + len)
            .ok_or_else(|| Error::InvalidDictZip("extra subfield overruns header".to_string()))?;

        if &id == b"RA" {
            let mut body = body;
            let version = body.read_u16::<LittleEndian>().map_err(header_error)?;
            if version != 1 {
                return Err(Error::InvalidDictZip(format!(
                    "unsupported RA version {}",
                    version
                )));
            }
            let chunk_len = body.read_u16::<LittleEndian>().map_err(header_error)?;
            let chunk_count = body.read_u16::<LittleEndian>().map_err(header_error)?;
            if chunk_len == 0 {
                return Err(Error::InvalidDictZip("zero chunk length".to_string()));
            }
            let sizes = (0..chunk_count)
                .map(|_| body.read_u16::<LittleEndian>())
                .collect::<io::Result<Vec<u16>>>()
                .map_err(header_error)?;
            return Ok((chunk_len, sizes));
        }

        extra = &extra[4 + len..];
    }

    Err(Error::InvalidDictZip(
        "no RA subfield in extra header".to_string(),
    ))
}

fn skip_zero_terminated<R: Read>(reader: &mut R) -> Result<u64> {
    let mut count = 0;
    loop {
        count += 1;
        if reader.read_u8().map_err(header_error)? == 0 {
            return Ok(count);
        }
    }
}

fn header_error(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::InvalidDictZip("truncated header".to_string())
    } else {
        Error::Io(err)
    }
}

/// Inflate one full-flushed chunk, appending to `out`.
fn inflate_chunk(compressed: &[u8], chunk_len: usize, out: &mut Vec<u8>) -> io::Result<()> {
    let mut inflater = Decompress::new(false);
    out.reserve(chunk_len);

    loop {
        let consumed = inflater.total_in() as usize;
        let before = out.len();
        let status = inflater
            .decompress_vec(&compressed[consumed..], out, FlushDecompress::Sync)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if status == Status::StreamEnd || inflater.total_in() as usize >= compressed.len() {
            return Ok(());
        }
        if out.len() == out.capacity() {
            out.reserve(chunk_len);
        } else if out.len() == before && inflater.total_in() as usize == consumed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "dictzip chunk does not inflate",
            ));
        }
    }
}

/// Dictzip body with a mutex-guarded handle.
pub struct DictZipFile {
    file: Mutex<File>,
    table: ChunkTable,
}

impl DictZipFile {
    /// Open a `.dict.dz` file and read its chunk table.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let table = ChunkTable::parse(&mut BufReader::new(&mut file))?;
        debug!(
            "Opened dictzip {:?}: {} chunks of {} bytes",
            path,
            table.chunk_count(),
            table.chunk_len
        );
        Ok(Self {
            file: Mutex::new(file),
            table,
        })
    }

    /// The parsed chunk table.
    pub fn chunk_table(&self) -> &ChunkTable {
        &self.table
    }
}

impl ArticleSource for DictZipFile {
    fn read_at(&self, offset: u64, length: u32) -> io::Result<Vec<u8>> {
        if length == 0 {
            return Ok(Vec::new());
        }

        let chunk_len = u64::from(self.table.chunk_len);
        let end = offset
            .checked_add(u64::from(length))
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "offset overflow"))?;
        let first = (offset / chunk_len) as usize;
        let last = ((end - 1) / chunk_len) as usize;
        if last >= self.table.chunk_count() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "article beyond end of dictzip body",
            ));
        }

        let start = self.table.offsets[first];
        let stop = self.table.offsets[last + 1];
        let mut compressed = vec![0u8; (stop - start) as usize];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(&mut compressed)?;
        }

        let mut inflated = Vec::with_capacity((last - first + 1) * chunk_len as usize);
        for chunk in first..=last {
            let from = (self.table.offsets[chunk] - start) as usize;
            let to = (self.table.offsets[chunk + 1] - start) as usize;
            inflate_chunk(&compressed[from..to], chunk_len as usize, &mut inflated)?;
        }

        let skip = (offset - first as u64 * chunk_len) as usize;
        let take = length as usize;
        if inflated.len() < skip + take {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "dictzip chunk shorter than expected",
            ));
        }
        inflated.truncate(skip + take);
        Ok(inflated.split_off(skip))
    }

    fn is_compressed(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compress, Compression, FlushCompress};
    use std::io::Write;

    /// Encode `data` as a dictzip file with the given chunk size.
    fn dictzip(data: &[u8], chunk_len: usize) -> Vec<u8> {
        let mut compress = Compress::new(Compression::default(), false);
        let chunks: Vec<&[u8]> = data.chunks(chunk_len).collect();
        let mut sizes = Vec::new();
        let mut body = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let flush = if i + 1 == chunks.len() {
                FlushCompress::Finish
            } else {
                FlushCompress::Full
            };
            let mut out = Vec::with_capacity(chunk.len() * 2 + 64);
            compress.compress_vec(chunk, &mut out, flush).unwrap();
            sizes.push(out.len() as u16);
            body.extend(out);
        }

        let mut file = vec![0x1f, 0x8b, 8, FEXTRA | FNAME, 0, 0, 0, 0, 0, 3];
        let ra_len = 6 + 2 * sizes.len() as u16;
        file.extend_from_slice(&(ra_len + 4).to_le_bytes());
        file.extend_from_slice(b"RA");
        file.extend_from_slice(&ra_len.to_le_bytes());
        file.extend_from_slice(&1u16.to_le_bytes());
        file.extend_from_slice(&(chunk_len as u16).to_le_bytes());
        file.extend_from_slice(&(sizes.len() as u16).to_le_bytes());
        for size in &sizes {
            file.extend_from_slice(&size.to_le_bytes());
        }
        file.extend_from_slice(b"test.dict\0");
        file.extend(body);

        let mut crc = flate2::Crc::new();
        crc.update(data);
        file.extend_from_slice(&crc.sum().to_le_bytes());
        file.extend_from_slice(&(data.len() as u32).to_le_bytes());
        file
    }

    fn open_dictzip(data: &[u8], chunk_len: usize) -> (tempfile::NamedTempFile, DictZipFile) {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&dictzip(data, chunk_len)).unwrap();
        tmp.flush().unwrap();
        let reader = DictZipFile::open(tmp.path()).unwrap();
        (tmp, reader)
    }

    fn sample_body() -> Vec<u8> {
        (0..1000u32)
            .flat_map(|i| format!("word{:04};", i).into_bytes())
            .collect()
    }

    #[test]
    fn test_chunk_table() {
        let body = sample_body();
        let (_tmp, reader) = open_dictzip(&body, 1024);
        let table = reader.chunk_table();
        assert_eq!(table.chunk_len, 1024);
        assert_eq!(table.chunk_count(), (body.len() + 1023) / 1024);
        assert!(reader.is_compressed());
    }

    #[test]
    fn test_read_within_chunk() {
        let body = sample_body();
        let (_tmp, reader) = open_dictzip(&body, 1024);
        assert_eq!(reader.read_at(0, 9).unwrap(), b"word0000;");
        assert_eq!(reader.read_at(90, 9).unwrap(), b"word0010;");
    }

    #[test]
    fn test_read_across_chunks() {
        let body = sample_body();
        let (_tmp, reader) = open_dictzip(&body, 256);
        let offset = 250u64;
        let got = reader.read_at(offset, 600).unwrap();
        assert_eq!(got, &body[250..850]);

        let tail = body.len() as u64 - 9;
        assert_eq!(reader.read_at(tail, 9).unwrap(), b"word0999;");
    }

    #[test]
    fn test_read_beyond_end() {
        let body = sample_body();
        let (_tmp, reader) = open_dictzip(&body, 1024);
        let err = reader.read_at(body.len() as u64 - 2, 10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_plain_gzip_rejected() {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"not random access").unwrap();
        let gz = encoder.finish().unwrap();

        let result = ChunkTable::parse(&mut &gz[..]);
        assert!(matches!(result, Err(Error::InvalidDictZip(_))));
    }

    #[test]
    fn test_truncated_header() {
        let data = dictzip(b"abc", 16);
        let result = ChunkTable::parse(&mut &data[..14]);
        assert!(matches!(result, Err(Error::InvalidDictZip(_))));
    }
}
