//! Request-line parsing
//!
//! Splits `METHOD SP TARGET SP VERSION` into its tokens. Only the path is
//! interpreted further: the query and fragment are cut from the target.

use std::fmt;

use crate::http::request::Request;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// No space after the method token.
    MissingMethodSeparator,
    /// No space after the request-target token.
    MissingTargetSeparator,
    /// The caller claimed to have consumed more bytes than the line holds.
    NegativeVersionLength,
    /// The request-target has no path before its query or fragment.
    EmptyPath,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingMethodSeparator => write!(f, "no separator after method"),
            ParseError::MissingTargetSeparator => write!(f, "no separator after request-target"),
            ParseError::NegativeVersionLength => write!(f, "request line shorter than consumed prefix"),
            ParseError::EmptyPath => write!(f, "request-target has an empty path"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Splits off the token before the first space.
///
/// Returns the token and everything after the space.
fn token_before_space(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let n = line.iter().position(|&b| b == b' ')?;
    Some((&line[..n], &line[n + 1..]))
}

pub fn extract_method(line: &[u8]) -> Result<(&[u8], &[u8]), ParseError> {
    token_before_space(line).ok_or(ParseError::MissingMethodSeparator)
}

pub fn extract_target(rest: &[u8]) -> Result<(&[u8], &[u8]), ParseError> {
    token_before_space(rest).ok_or(ParseError::MissingTargetSeparator)
}

/// Everything after the first `consumed` bytes of `line`, unvalidated.
pub fn extract_version(line: &[u8], consumed: usize) -> Result<&[u8], ParseError> {
    let remaining = line
        .len()
        .checked_sub(consumed)
        .ok_or(ParseError::NegativeVersionLength)?;
    Ok(&line[line.len() - remaining..])
}

/// The request-target up to, not including, the first `?` or `#`.
pub fn extract_path(target: &str) -> &str {
    match target.find(['?', '#']) {
        Some(end) => &target[..end],
        None => target,
    }
}

/// Parses `METHOD SP REQUEST-TARGET SP VERSION` into a [`Request`].
pub fn parse_request_line(line: &[u8]) -> Result<Request, ParseError> {
    let (method, rest) = extract_method(line)?;
    let (target, _) = extract_target(rest)?;
    let consumed = method.len() + 1 + target.len() + 1;
    let version = extract_version(line, consumed)?;

    let target = lossy(target);
    let path = extract_path(&target).to_string();
    if path.is_empty() {
        return Err(ParseError::EmptyPath);
    }

    Ok(Request {
        line: lossy(line),
        method: lossy(method),
        target,
        version: lossy(version),
        path,
    })
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = parse_request_line(b"GET / HTTP/1.1").unwrap();

        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/");
        assert_eq!(req.version, "HTTP/1.1");
    }

    #[test]
    fn version_is_taken_verbatim() {
        let req = parse_request_line(b"GET /a  extra words").unwrap();
        assert_eq!(req.target, "/a");
        assert_eq!(req.version, " extra words");
    }
}
