//! TFRecord framing for streams of encoded records.
//!
//! Each record in a TFRecord file has the following format:
//! - `uint64` length
//! - `uint32` masked CRC32C of length
//! - `byte[length]` data
//! - `uint32` masked CRC32C of data
//!
//! All integers are little-endian. The payload is opaque here; the
//! `*_instance` helpers pair the framing with an [`ExampleCodec`].
//!
//! ```
//! use std::io::Cursor;
//! use tft_coders::tfrecord::{TFRecordReader, TFRecordWriter};
//!
//! let mut buffer = Vec::new();
//! let mut writer = TFRecordWriter::new(&mut buffer);
//! writer.write_record(b"hello").unwrap();
//! writer.flush().unwrap();
//!
//! let mut reader = TFRecordReader::new(Cursor::new(buffer), true);
//! assert_eq!(reader.read_record().unwrap().unwrap().as_ref(), b"hello");
//! assert!(reader.read_record().unwrap().is_none());
//! ```

use std::io::{self, Read, Write};

use bytes::Bytes;
use thiserror::Error;

use crate::codec::ExampleCodec;
use crate::error::CoderError;
use crate::value::Instance;

/// Errors that can occur when reading or writing TFRecord streams.
#[derive(Error, Debug)]
pub enum TFRecordError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CRC checksum mismatch.
    #[error("CRC checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    CrcMismatch {
        /// The expected CRC value.
        expected: u32,
        /// The actual CRC value.
        actual: u32,
    },

    /// The stream ended inside a record.
    #[error("Unexpected end of file inside a record")]
    UnexpectedEof,

    /// The payload could not be encoded or decoded.
    #[error(transparent)]
    Coder(#[from] CoderError),
}

/// Result type for TFRecord operations.
pub type Result<T> = std::result::Result<T, TFRecordError>;

/// Reads length-prefixed, checksummed records.
pub struct TFRecordReader<R> {
    reader: R,
    verify_crc: bool,
}

impl<R: Read> TFRecordReader<R> {
    /// Creates a new TFRecord reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The underlying reader
    /// * `verify_crc` - Whether to verify CRC checksums
    pub fn new(reader: R, verify_crc: bool) -> Self {
        Self { reader, verify_crc }
    }

    /// Reads the next raw record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` - The next record's data
    /// - `Ok(None)` - Clean end of stream
    /// - `Err(e)` - An error occurred, including a truncated record
    pub fn read_record(&mut self) -> Result<Option<Bytes>> {
        let mut length_buf = [0u8; 8];
        match read_full(&mut self.reader, &mut length_buf)? {
            0 => return Ok(None),
            8 => {}
            n => {
                tracing::warn!(bytes = n, "Truncated TFRecord length header");
                return Err(TFRecordError::UnexpectedEof);
            }
        }
        let length = u64::from_le_bytes(length_buf);

        let length_crc = self.read_u32()?;
        if self.verify_crc {
            check_crc(&length_buf, length_crc)?;
        }

        // The header is untrusted: grow the buffer only as payload arrives.
        let mut data = Vec::new();
        (&mut self.reader).take(length).read_to_end(&mut data)?;
        if data.len() as u64 != length {
            tracing::warn!(
                expected = length,
                actual = data.len(),
                "Truncated TFRecord payload"
            );
            return Err(TFRecordError::UnexpectedEof);
        }

        let data_crc = self.read_u32()?;
        if self.verify_crc {
            check_crc(&data, data_crc)?;
        }

        Ok(Some(Bytes::from(data)))
    }

    /// Reads and decodes the next record with `codec`.
    pub fn read_instance(&mut self, codec: &ExampleCodec) -> Result<Option<Instance>> {
        match self.read_record()? {
            Some(data) => Ok(Some(codec.decode(&data)?)),
            None => Ok(None),
        }
    }

    /// Iterates over the remaining raw records.
    pub fn records(&mut self) -> impl Iterator<Item = Result<Bytes>> + '_ {
        std::iter::from_fn(move || self.read_record().transpose())
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        if read_full(&mut self.reader, &mut buf)? != buf.len() {
            tracing::warn!("Truncated TFRecord checksum");
            return Err(TFRecordError::UnexpectedEof);
        }
        Ok(u32::from_le_bytes(buf))
    }
}

/// Writes length-prefixed, checksummed records.
pub struct TFRecordWriter<W> {
    writer: W,
}

impl<W: Write> TFRecordWriter<W> {
    /// Creates a new TFRecord writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a raw record.
    pub fn write_record(&mut self, data: &[u8]) -> Result<()> {
        let length_bytes = (data.len() as u64).to_le_bytes();
        self.writer.write_all(&length_bytes)?;
        self.writer
            .write_all(&masked_crc32c(&length_bytes).to_le_bytes())?;
        self.writer.write_all(data)?;
        self.writer.write_all(&masked_crc32c(data).to_le_bytes())?;
        Ok(())
    }

    /// Encodes `instance` with `codec` and writes it as one record.
    pub fn write_instance(&mut self, codec: &mut ExampleCodec, instance: &Instance) -> Result<()> {
        let data = codec.encode(instance)?;
        self.write_record(&data)
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Unwraps the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Fills `buf` as far as the stream allows; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn check_crc(data: &[u8], actual: u32) -> Result<()> {
    let expected = masked_crc32c(data);
    if expected == actual {
        Ok(())
    } else {
        Err(TFRecordError::CrcMismatch { expected, actual })
    }
}

/// Computes the masked CRC32C checksum used by TFRecord.
///
/// The mask is: `((crc >> 15) | (crc << 17)) + 0xa282ead8`
fn masked_crc32c(data: &[u8]) -> u32 {
    crc32c(data).rotate_right(15).wrapping_add(0xa282ead8)
}

/// Bitwise CRC32C (Castagnoli).
fn crc32c(data: &[u8]) -> u32 {
    const POLY: u32 = 0x82f63b78;

    let mut crc = !0u32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY
            } else {
                crc >> 1
            };
        }
    }
    !crc
}
