//! Remote file store abstraction
//!
//! A store exposes a current directory plus a handful of primitives;
//! [`RemoteStore::change_or_create_dir`], [`RemoteStore::download`] and
//! [`RemoteStore::upload`] are built on top of them so every transport
//! shares the same path rules.

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A file store with a current working directory
pub trait RemoteStore {
    /// Enter `dir`: `/` is the root, anything else one child segment
    fn change_dir(&mut self, dir: &str) -> Result<()>;

    /// Create child directory `dir` of the current directory
    fn make_dir(&mut self, dir: &str) -> Result<()>;

    /// Read `filename` from the current directory
    fn retrieve(&mut self, filename: &str) -> Result<Vec<u8>>;

    /// Write `filename` in the current directory, replacing it if present
    fn store(&mut self, filename: &str, data: &[u8]) -> Result<()>;

    /// Release the connection
    fn close(&mut self) -> Result<()>;

    /// Descend a slash-separated path, creating missing segments.
    ///
    /// Empty paths and paths starting with `/` are resolved from the root,
    /// others from the current directory. Running it twice is harmless.
    fn change_or_create_dir(&mut self, path: &str) -> Result<()> {
        let path = path.replace('\\', "/");
        if path.is_empty() || path.starts_with('/') {
            self.change_dir("/")?;
        }

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if self.change_dir(segment).is_ok() {
                continue;
            }
            if let Err(e) = self.make_dir(segment) {
                debug!(segment, error = %e, "mkdir failed, retrying cwd");
            }
            self.change_dir(segment)?;
        }
        Ok(())
    }

    /// Fetch the file at `path`
    fn download(&mut self, path: &str) -> Result<Vec<u8>> {
        let (dir, filename) = split_remote_path(path);
        self.change_or_create_dir(&dir)?;
        self.retrieve(&filename)
    }

    /// Write `data` as `filename` inside `dir`, creating `dir` if needed
    fn upload(&mut self, dir: &str, filename: &str, data: &[u8]) -> Result<()> {
        self.change_or_create_dir(dir)?;
        self.store(filename, data)
    }
}

/// Split `path` into directory and file name.
///
/// Backslashes count as separators; a bare file name lives in `/`.
pub fn split_remote_path(path: &str) -> (String, String) {
    let path = path.replace('\\', "/");
    match path.rsplit_once('/') {
        Some(("", file)) => ("/".to_string(), file.to_string()),
        Some((dir, file)) => (dir.to_string(), file.to_string()),
        None => ("/".to_string(), path),
    }
}

/// A [`RemoteStore`] over a local directory tree
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    cwd: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`, which must exist
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::file(
                &root,
                io::Error::new(io::ErrorKind::NotFound, "root is not a directory"),
            ));
        }
        Ok(Self {
            cwd: root.clone(),
            root,
        })
    }

    /// Current directory on disk
    pub fn current_dir(&self) -> &Path {
        &self.cwd
    }

    fn child(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.cwd.join(name)),
            _ => Err(Error::file(
                self.cwd.join(name),
                io::Error::new(io::ErrorKind::InvalidInput, "not a plain path segment"),
            )),
        }
    }
}

impl RemoteStore for LocalStore {
    fn change_dir(&mut self, dir: &str) -> Result<()> {
        if dir == "/" {
            self.cwd = self.root.clone();
            return Ok(());
        }
        let target = self.child(dir)?;
        if !target.is_dir() {
            return Err(Error::file(
                target,
                io::Error::new(io::ErrorKind::NotFound, "no such directory"),
            ));
        }
        self.cwd = target;
        Ok(())
    }

    fn make_dir(&mut self, dir: &str) -> Result<()> {
        let target = self.child(dir)?;
        fs::create_dir(&target).map_err(|e| Error::file(target, e))
    }

    fn retrieve(&mut self, filename: &str) -> Result<Vec<u8>> {
        let path = self.child(filename)?;
        fs::read(&path).map_err(|e| Error::file(path, e))
    }

    fn store(&mut self, filename: &str, data: &[u8]) -> Result<()> {
        let path = self.child(filename)?;
        fs::write(&path, data).map_err(|e| Error::file(path, e))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_remote_path() {
        assert_eq!(
            split_remote_path("/listini/LISTINI.csv"),
            ("/listini".to_string(), "LISTINI.csv".to_string())
        );
        assert_eq!(
            split_remote_path("LISTINI.csv"),
            ("/".to_string(), "LISTINI.csv".to_string())
        );
        assert_eq!(
            split_remote_path("/LISTINI.csv"),
            ("/".to_string(), "LISTINI.csv".to_string())
        );
        assert_eq!(
            split_remote_path("in\\sub\\file.csv"),
            ("in/sub".to_string(), "file.csv".to_string())
        );
    }

    #[test]
    fn test_change_or_create_dir_creates_segments() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path()).unwrap();

        store.change_or_create_dir("/out/2024//feb/").unwrap();
        assert_eq!(store.current_dir(), dir.path().join("out/2024/feb"));

        // Second descent from the root reuses the existing directories
        store.change_or_create_dir("/out/2024").unwrap();
        assert_eq!(store.current_dir(), dir.path().join("out/2024"));

        store.change_or_create_dir("").unwrap();
        assert_eq!(store.current_dir(), dir.path());
    }

    #[test]
    fn test_relative_path_descends_from_current() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path()).unwrap();
        store.change_or_create_dir("a").unwrap();
        store.change_or_create_dir("b").unwrap();
        assert_eq!(store.current_dir(), dir.path().join("a/b"));
    }

    #[test]
    fn test_upload_then_download() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path()).unwrap();

        store.upload("/out", "result.csv", b"A;B\n").unwrap();
        assert_eq!(store.download("/out/result.csv").unwrap(), b"A;B\n");
        assert!(dir.path().join("out/result.csv").is_file());
    }

    #[test]
    fn test_download_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.download("/missing.csv"),
            Err(Error::File { .. })
        ));
    }

    #[test]
    fn test_parent_segments_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path()).unwrap();
        assert!(store.change_dir("..").is_err());
        assert!(store.store("../escape.csv", b"x").is_err());
    }
}
