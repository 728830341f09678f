use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::fs::{Resolved, Resolver};
use crate::http::line::{read_line, LineBuffer, LineError};
use crate::http::parser::parse_request_line;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer;

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The peer closed before sending anything; no response was written.
    Idle,
    /// A response with `status` was written (or attempted).
    Responded {
        status: StatusCode,
        /// Resolved filesystem path, or the raw request line if resolution
        /// never happened
        path: String,
        /// File bytes streamed after the head
        body_bytes: u64,
    },
}

impl Outcome {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Outcome::Idle => None,
            Outcome::Responded { status, .. } => Some(*status),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status().is_some_and(|s| s.is_success())
    }
}

pub enum ConnectionState {
    Reading,
    Resolving(Request),
    Writing(Response, String),
    Closed(Outcome),
}

enum ReadFailure {
    Idle,
    BadRequest(String),
}

/// One connection's lifecycle: read and parse the request, resolve the
/// target, write the response, close.
///
/// ```text
///   Reading ──parse ok──▶ Resolving ──▶ Writing ──▶ Closed
///      │                                  ▲
///      ├──bad request─────────────────────┘
///      └──peer closed at start──────────────────▶ Closed
/// ```
pub struct Connection<'a, S> {
    stream: BufReader<S>,
    line: &'a mut LineBuffer,
    resolver: &'a Resolver,
}

impl<'a, S> Connection<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, line: &'a mut LineBuffer, resolver: &'a Resolver) -> Self {
        Self {
            stream: BufReader::new(stream),
            line,
            resolver,
        }
    }

    pub async fn run(mut self) -> Outcome {
        let mut state = ConnectionState::Reading;

        loop {
            state = match state {
                ConnectionState::Reading => match self.read_request().await {
                    Ok(req) => ConnectionState::Resolving(req),
                    Err(ReadFailure::Idle) => ConnectionState::Closed(Outcome::Idle),
                    Err(ReadFailure::BadRequest(line)) => {
                        ConnectionState::Writing(Response::bad_request(), line)
                    }
                },

                ConnectionState::Resolving(req) => match self.resolver.lookup(&req.path).await {
                    Resolved::Found { file, path } => {
                        ConnectionState::Writing(Response::file(file), path)
                    }
                    Resolved::NotFound { path } => {
                        ConnectionState::Writing(Response::not_found(), path)
                    }
                },

                ConnectionState::Writing(response, path) => {
                    let status = response.status;
                    match writer::write_response(&mut self.stream, response).await {
                        Ok(body_bytes) => ConnectionState::Closed(Outcome::Responded {
                            status,
                            path,
                            body_bytes,
                        }),
                        Err(e) => {
                            tracing::warn!(error = %e, path = %path, "Failed to write response");
                            // Only a clean connection can still carry a 500.
                            if !e.head_started() {
                                let _ = writer::serve_error(
                                    &mut self.stream,
                                    StatusCode::InternalServerError,
                                )
                                .await;
                            }
                            ConnectionState::Closed(Outcome::Responded {
                                status: StatusCode::InternalServerError,
                                path,
                                body_bytes: 0,
                            })
                        }
                    }
                }

                ConnectionState::Closed(outcome) => {
                    let _ = self.stream.shutdown().await;
                    return outcome;
                }
            };
        }
    }

    async fn read_request(&mut self) -> Result<Request, ReadFailure> {
        match read_line(&mut self.stream, self.line).await {
            Ok(_) => {}
            Err(LineError::EndOfInputAtStart) => return Err(ReadFailure::Idle),
            Err(e) => {
                tracing::debug!(error = %e, "Unreadable request line");
                return Err(ReadFailure::BadRequest(self.raw_line()));
            }
        }

        let request = parse_request_line(self.line.as_bytes()).map_err(|e| {
            tracing::debug!(error = %e, line = %self.raw_line(), "Malformed request line");
            ReadFailure::BadRequest(self.raw_line())
        })?;
        tracing::debug!(line = %request.line, "Request line");

        self.drain_headers(&request).await?;
        Ok(request)
    }

    /// Reads and discards header lines up to the blank line. End of input at
    /// the start of a line also ends the block.
    async fn drain_headers(&mut self, request: &Request) -> Result<(), ReadFailure> {
        loop {
            match read_line(&mut self.stream, self.line).await {
                Ok(0) | Err(LineError::EndOfInputAtStart) => return Ok(()),
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "Malformed header block");
                    return Err(ReadFailure::BadRequest(request.line.clone()));
                }
            }
        }
    }

    fn raw_line(&self) -> String {
        String::from_utf8_lossy(self.line.as_bytes()).into_owned()
    }
}
