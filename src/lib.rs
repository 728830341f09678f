//! Docroot - Static File Server
//!
//! Serves the files under one directory over a minimal HTTP/1.1 subset,
//! handling a bounded number of connections at once with a fixed pool of
//! workers.

pub mod config;
pub mod fs;
pub mod http;
pub mod server;
