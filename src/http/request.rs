/// A parsed HTTP request line.
///
/// Only the request line is kept; header lines are read and discarded by the
/// connection. Tokens are stored verbatim (lossily decoded as UTF-8), with no
/// percent-decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The raw request line, without its CRLF
    pub line: String,
    /// The method token (e.g. "GET")
    pub method: String,
    /// The full request-target, including any query or fragment
    pub target: String,
    /// The protocol-version token (e.g. "HTTP/1.1")
    pub version: String,
    /// The request-target with any `?query` or `#fragment` removed
    pub path: String,
}

