//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.x subset: one request per connection, only the
//! request line is interpreted, and every response ends by closing the
//! connection.
//!
//! # Architecture
//!
//! - **`line`**: reads CRLF-terminated lines into a reusable, growable buffer
//! - **`parser`**: splits a request line into method, target and version
//! - **`request`**: the parsed request line
//! - **`response`**: status codes and response bodies
//! - **`writer`**: serializes response heads and streams file bodies
//! - **`connection`**: the per-connection state machine tying these together
//!
//! # Wire format
//!
//! ```text
//! GET /docs/?v=2 HTTP/1.1\r\n      ← only this line is parsed
//! Host: example.com\r\n            ← read and discarded
//! \r\n                             ← end of request (or end of stream)
//!
//! HTTP/1.1 200 OK\r\n
//! Connection: close\r\n
//! Cache-Control: max-age=300\r\n
//! \r\n
//! <file bytes until close>
//! ```

pub mod connection;
pub mod line;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
