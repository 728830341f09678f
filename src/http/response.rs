use tokio::fs::File;

/// HTTP status codes the server can produce.
///
/// - `Ok` (200): file found and streamed
/// - `BadRequest` (400): malformed or truncated request line
/// - `NotFound` (404): target missing, or a directory without an index file
/// - `InternalServerError` (500): failure while writing the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use docroot::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use docroot::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// The one-line body sent with an error status.
    pub fn error_body(&self) -> Option<&'static str> {
        match self {
            StatusCode::Ok => None,
            StatusCode::BadRequest => Some("Bad request"),
            StatusCode::NotFound => Some("Not found"),
            StatusCode::InternalServerError => Some("Internal server error"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }
}

/// What follows the response head.
#[derive(Debug)]
pub enum Body {
    /// An open file, streamed until end-of-file
    File(File),
    /// A short literal text line
    Text(&'static str),
}

/// A response ready to be written to a client.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub body: Body,
}

impl Response {
    /// A 200 response streaming `file`.
    pub fn file(file: File) -> Self {
        Self {
            status: StatusCode::Ok,
            body: Body::File(file),
        }
    }

    /// An error response with the status's literal body.
    pub fn error(status: StatusCode) -> Self {
        Self {
            status,
            body: Body::Text(status.error_body().unwrap_or_default()),
        }
    }

    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound)
    }

    pub fn bad_request() -> Self {
        Self::error(StatusCode::BadRequest)
    }

    pub fn internal_error() -> Self {
        Self::error(StatusCode::InternalServerError)
    }
}
