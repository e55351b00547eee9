//! File system port used by the site assembler
//!
//! `LocalFs` is the real implementation. Tests substitute an in-memory
//! `MockFileSystem` to exercise write-failure paths.

use std::io;
use std::path::Path;

use crate::hash::ContentHash;

/// Abstract file system interface
pub trait FileSystem {
    /// Read file content
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write file content atomically, creating parent directories
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    /// Check if a file exists
    fn exists(&self, path: &Path) -> bool;

    /// Remove a file
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory only if it is empty; returns whether it was removed
    fn remove_dir_if_empty(&self, path: &Path) -> io::Result<bool>;

    /// Create a directory and all parents
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Compute SHA256 hash of file content
    fn hash(&self, path: &Path) -> io::Result<ContentHash> {
        self.read(path).map(|bytes| ContentHash::from_bytes(&bytes))
    }
}

/// Local file system implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        use std::io::Write;

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)?;

        // tempfile + rename so readers (e.g. the preview server) never see
        // a half-written page
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn remove_dir_if_empty(&self, path: &Path) -> io::Result<bool> {
        if !path.is_dir() || std::fs::read_dir(path)?.next().is_some() {
            return Ok(false);
        }
        std::fs::remove_dir(path)?;
        Ok(true)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// In-memory file system for tests
///
/// Uses `Arc<Mutex<>>` internally so it can be cloned and shared.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockFileSystem {
    pub files: std::sync::Arc<
        std::sync::Mutex<std::collections::BTreeMap<std::path::PathBuf, Vec<u8>>>,
    >,
    /// Writes to this path fail with `PermissionDenied`
    pub fail_on: Option<std::path::PathBuf>,
}

#[cfg(test)]
impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            fail_on: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        let files = self.files.lock().unwrap();
        files
            .get(path)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn paths(&self) -> Vec<std::path::PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        if self.fail_on.as_deref() == Some(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only file system",
            ));
        }
        let mut files = self.files.lock().unwrap();
        files.insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut files = self.files.lock().unwrap();
        files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }

    fn remove_dir_if_empty(&self, path: &Path) -> io::Result<bool> {
        let files = self.files.lock().unwrap();
        Ok(!files.keys().any(|p| p.starts_with(path)))
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}
