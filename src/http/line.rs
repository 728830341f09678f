//! CRLF-delimited line reading.
//!
//! Request lines and header lines are read one byte at a time into a
//! [`LineBuffer`] owned by the worker, so the allocation is reused across
//! every request that worker serves. Callers should hand in a buffered
//! reader; reading byte-wise from a raw socket costs one syscall per byte.

use std::fmt;
use std::io;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Initial capacity of a worker's line buffer.
pub const DEFAULT_LINE_CAPACITY: usize = 64;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Ways reading a single line can fail.
#[derive(Debug)]
pub enum LineError {
    /// The stream ended before any byte of the line was read.
    EndOfInputAtStart,
    /// The stream ended after part of the line was buffered.
    EndOfInputMidLine,
    /// A CR was not immediately followed by LF.
    MalformedLineTerminator,
    /// The underlying transport failed.
    Io(io::Error),
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::EndOfInputAtStart => write!(f, "end of input before line start"),
            LineError::EndOfInputMidLine => write!(f, "end of input in the middle of a line"),
            LineError::MalformedLineTerminator => write!(f, "CR not followed by LF"),
            LineError::Io(e) => write!(f, "i/o error while reading line: {}", e),
        }
    }
}

impl std::error::Error for LineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LineError {
    fn from(e: io::Error) -> Self {
        LineError::Io(e)
    }
}

/// Growable byte buffer holding the content of the last line read.
///
/// Capacity doubles whenever a push would overflow it and is never shrunk,
/// so a worker that once saw a long line keeps the larger buffer.
#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LINE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, byte: u8) {
        if self.buf.len() == self.capacity {
            self.capacity *= 2;
            self.buf.reserve(self.capacity - self.buf.len());
        }
        self.buf.put_u8(byte);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Logical capacity; grows by doubling.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads one CRLF-terminated line into `line`, replacing its previous content.
///
/// Returns the number of content bytes (CRLF excluded). `Ok(0)` is the empty
/// line that terminates a header block. There is no resynchronisation after a
/// malformed terminator; the connection is expected to be dropped.
pub async fn read_line<R>(reader: &mut R, line: &mut LineBuffer) -> Result<usize, LineError>
where
    R: AsyncRead + Unpin,
{
    line.clear();

    loop {
        let byte = match next_byte(reader).await? {
            Some(b) => b,
            None if line.is_empty() => return Err(LineError::EndOfInputAtStart),
            None => return Err(LineError::EndOfInputMidLine),
        };

        if byte == CR {
            return match next_byte(reader).await? {
                Some(LF) => Ok(line.len()),
                _ => Err(LineError::MalformedLineTerminator),
            };
        }

        line.push(byte);
    }
}

async fn next_byte<R>(reader: &mut R) -> Result<Option<u8>, LineError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_u8().await {
        Ok(b) => Ok(Some(b)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(LineError::Io(e)),
    }
}
