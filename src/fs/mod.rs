//! Filesystem side of request handling: the serving root and the
//! request-path to open-file resolution.

pub mod resolve;

pub use resolve::{Resolved, Resolver, ServingRoot};
