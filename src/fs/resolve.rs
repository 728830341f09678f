//! Request path resolution
//!
//! Paths are formed by plain string concatenation of the serving root and
//! the request path. `..` segments are not normalised, so a request can
//! name files outside the root.

use std::path::Path;

use tokio::fs::File;

/// Directory prefix every request path is joined onto.
///
/// Never ends in `/`, so joining needs no separator check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServingRoot(String);

impl ServingRoot {
    pub fn new(root: impl Into<String>) -> Self {
        let mut root = root.into();
        while root.ends_with('/') {
            root.pop();
        }
        Self(root)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Concatenates the root and `path` verbatim.
    pub fn resolve(&self, path: &str) -> String {
        let mut full = String::with_capacity(self.0.len() + path.len());
        full.push_str(&self.0);
        full.push_str(path);
        full
    }
}

/// Result of looking up a request path.
#[derive(Debug)]
pub enum Resolved {
    /// An open, non-directory file and the path it was opened from
    Found { file: File, path: String },
    /// Nothing servable; `path` is the last path tried
    NotFound { path: String },
}

/// Opens `path` for reading, refusing directories.
///
/// Every failure, including permission and I/O errors, is reported as `None`.
pub async fn open_non_directory(path: impl AsRef<Path>) -> Option<File> {
    let file = File::open(path.as_ref()).await.ok()?;
    let meta = file.metadata().await.ok()?;
    if meta.is_dir() {
        return None;
    }
    Some(file)
}

/// Appends `index_file` to `path`, adding a `/` first if needed.
pub fn append_index(path: &str, index_file: &str) -> String {
    let mut full = String::with_capacity(path.len() + 1 + index_file.len());
    full.push_str(path);
    if !full.ends_with('/') {
        full.push('/');
    }
    full.push_str(index_file);
    full
}

/// Opens `path`, or failing that `path/<index_file>`. One retry only.
pub async fn with_index_fallback(path: String, index_file: &str) -> Resolved {
    if let Some(file) = open_non_directory(&path).await {
        return Resolved::Found { file, path };
    }

    let path = append_index(&path, index_file);
    match open_non_directory(&path).await {
        Some(file) => Resolved::Found { file, path },
        None => Resolved::NotFound { path },
    }
}

/// Maps request paths to open files under a [`ServingRoot`].
#[derive(Debug, Clone)]
pub struct Resolver {
    root: ServingRoot,
    index_file: String,
}

impl Resolver {
    pub fn new(root: ServingRoot, index_file: impl Into<String>) -> Self {
        Self {
            root,
            index_file: index_file.into(),
        }
    }

    pub async fn lookup(&self, request_path: &str) -> Resolved {
        with_index_fallback(self.root.resolve(request_path), &self.index_file).await
    }
}
