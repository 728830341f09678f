use std::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

use crate::http::response::{Body, Response, StatusCode};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Files are streamed in chunks of this size.
const BUFFER_SIZE: usize = 8192;

/// Seconds a client may cache a served file.
pub const CACHE_MAX_AGE: u32 = 60 * 5;

/// Why writing a response stopped.
#[derive(Debug)]
pub enum ServeError {
    /// The file could not be read before any response bytes were written;
    /// the connection is still clean and can carry an error response.
    Unreadable(io::Error),
    /// The failure happened once the response head had started; nothing
    /// more can be written without corrupting the response.
    Interrupted(io::Error),
}

impl ServeError {
    pub fn head_started(&self) -> bool {
        matches!(self, ServeError::Interrupted(_))
    }
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServeError::Unreadable(e) => write!(f, "file unreadable: {}", e),
            ServeError::Interrupted(e) => write!(f, "response interrupted: {}", e),
        }
    }
}

impl std::error::Error for ServeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServeError::Unreadable(e) | ServeError::Interrupted(e) => Some(e),
        }
    }
}

fn serialize_head(status: StatusCode) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        status.as_u16(),
        status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    buf.extend_from_slice(b"Connection: close\r\n");
    if status.is_success() {
        buf.extend_from_slice(format!("Cache-Control: max-age={}\r\n", CACHE_MAX_AGE).as_bytes());
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Writes a 200 head, then the whole of `file`.
///
/// No Content-Length is sent; the body ends when the connection closes.
/// The first chunk is read before the head is written, so an unreadable
/// file leaves the connection untouched. Returns the number of body bytes
/// written.
pub async fn serve_file<W, R>(conn: &mut W, file: &mut R) -> Result<u64, ServeError>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; BUFFER_SIZE];
    let first = file.read(&mut chunk).await.map_err(ServeError::Unreadable)?;

    stream_body(conn, file, &mut chunk, first)
        .await
        .map_err(ServeError::Interrupted)
}

async fn stream_body<W, R>(
    conn: &mut W,
    file: &mut R,
    chunk: &mut [u8],
    first: usize,
) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    let mut out = BufWriter::new(conn);
    out.write_all(&serialize_head(StatusCode::Ok)).await?;

    let mut n = first;
    let mut written = 0u64;
    while n > 0 {
        out.write_all(&chunk[..n]).await?;
        written += n as u64;
        n = file.read(chunk).await?;
    }

    out.flush().await?;
    Ok(written)
}

/// Writes an error head followed by the status's one-line body.
pub async fn serve_error<W>(conn: &mut W, status: StatusCode) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_text(conn, status, status.error_body().unwrap_or_default()).await
}

async fn write_text<W>(conn: &mut W, status: StatusCode, text: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = serialize_head(status);
    buf.extend_from_slice(text.as_bytes());
    buf.extend_from_slice(b"\r\n");

    conn.write_all(&buf).await?;
    conn.flush().await
}

/// Writes `response`, returning the number of body bytes streamed from a file
/// (zero for error responses).
pub async fn write_response<W>(conn: &mut W, response: Response) -> Result<u64, ServeError>
where
    W: AsyncWrite + Unpin,
{
    match response.body {
        Body::File(mut file) => serve_file(conn, &mut file).await,
        Body::Text(text) => write_text(conn, response.status, text)
            .await
            .map(|_| 0)
            .map_err(ServeError::Interrupted),
    }
}
