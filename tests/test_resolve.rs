use std::fs;

use docroot::fs::resolve::{append_index, open_non_directory, with_index_fallback};
use docroot::fs::{Resolved, Resolver, ServingRoot};

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), b"<h1>home</h1>").unwrap();
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("a/b"), b"bee").unwrap();
    fs::create_dir_all(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs/index.html"), b"docs").unwrap();
    fs::create_dir_all(dir.path().join("empty")).unwrap();
    fs::create_dir_all(dir.path().join("weird/index.html")).unwrap();
    dir
}

fn found_path(resolved: &Resolved) -> Option<&str> {
    match resolved {
        Resolved::Found { path, .. } => Some(path.as_str()),
        Resolved::NotFound { .. } => None,
    }
}

fn root_of(dir: &tempfile::TempDir) -> String {
    dir.path().to_str().unwrap().to_string()
}

#[test]
fn test_resolve_concatenates_root_and_path() {
    let root = ServingRoot::new("/site/");
    assert_eq!(root.resolve("/a/b"), "/site/a/b");
    assert_eq!(root.resolve("/"), "/site/");
}

#[test]
fn test_resolve_does_not_normalize() {
    let root = ServingRoot::new("/site");
    assert_eq!(root.resolve("/../etc/passwd"), "/site/../etc/passwd");
}

#[test]
fn test_append_index() {
    assert_eq!(append_index("/site/", "index.html"), "/site/index.html");
    assert_eq!(append_index("/site", "default.htm"), "/site/default.htm");
}

#[tokio::test]
async fn test_open_non_directory_rejects_directories() {
    let dir = site();
    assert!(open_non_directory(dir.path().join("a")).await.is_none());
    assert!(open_non_directory(dir.path().join("a/b")).await.is_some());
    assert!(open_non_directory(dir.path().join("nope")).await.is_none());
}

#[tokio::test]
async fn test_lookup_plain_file() {
    let dir = site();
    let resolver = Resolver::new(ServingRoot::new(root_of(&dir)), "index.html");

    let resolved = resolver.lookup("/a/b").await;
    assert_eq!(found_path(&resolved), Some(format!("{}/a/b", root_of(&dir)).as_str()));
}

#[tokio::test]
async fn test_lookup_root_uses_index() {
    let dir = site();
    let resolver = Resolver::new(ServingRoot::new(root_of(&dir)), "index.html");

    let resolved = resolver.lookup("/").await;
    assert_eq!(
        found_path(&resolved),
        Some(format!("{}/index.html", root_of(&dir)).as_str())
    );
}

#[tokio::test]
async fn test_lookup_directory_without_trailing_slash_uses_index() {
    let dir = site();
    let resolver = Resolver::new(ServingRoot::new(root_of(&dir)), "index.html");

    let resolved = resolver.lookup("/docs").await;
    assert_eq!(
        found_path(&resolved),
        Some(format!("{}/docs/index.html", root_of(&dir)).as_str())
    );
}

#[tokio::test]
async fn test_lookup_directory_without_index_is_not_found() {
    let dir = site();
    let resolver = Resolver::new(ServingRoot::new(root_of(&dir)), "index.html");

    match resolver.lookup("/empty/").await {
        Resolved::NotFound { path } => assert!(path.ends_with("/empty/index.html")),
        Resolved::Found { path, .. } => panic!("unexpected file {}", path),
    }
}

#[tokio::test]
async fn test_lookup_index_that_is_a_directory_is_not_found() {
    let dir = site();
    let resolver = Resolver::new(ServingRoot::new(root_of(&dir)), "index.html");

    assert!(found_path(&resolver.lookup("/weird").await).is_none());
}

#[tokio::test]
async fn test_lookup_missing_file() {
    let dir = site();
    let resolver = Resolver::new(ServingRoot::new(root_of(&dir)), "index.html");

    assert!(found_path(&resolver.lookup("/missing.txt").await).is_none());
}

#[tokio::test]
async fn test_lookup_is_idempotent() {
    let dir = site();
    let resolver = Resolver::new(ServingRoot::new(root_of(&dir)), "index.html");

    for path in ["/a/b", "/docs/", "/empty", "/missing.txt"] {
        let first = found_path(&resolver.lookup(path).await).is_some();
        let second = found_path(&resolver.lookup(path).await).is_some();
        assert_eq!(first, second, "outcome changed for {}", path);
    }
}

#[tokio::test]
async fn test_lookup_follows_parent_segments() {
    let dir = site();
    fs::write(dir.path().join("outside.txt"), b"out").unwrap();
    let inner = format!("{}/a", root_of(&dir));
    let resolver = Resolver::new(ServingRoot::new(inner), "index.html");

    assert!(found_path(&resolver.lookup("/../outside.txt").await).is_some());
}

#[tokio::test]
async fn test_with_index_fallback_custom_index() {
    let dir = site();
    fs::write(dir.path().join("empty/home.htm"), b"home").unwrap();

    let path = format!("{}/empty", root_of(&dir));
    let resolved = with_index_fallback(path, "home.htm").await;
    assert!(found_path(&resolved).unwrap().ends_with("/empty/home.htm"));
}
