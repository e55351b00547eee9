//! Build manifest - records the artifacts of the last build
//!
//! Stored as `.folio-manifest.toml` inside the output directory. The next
//! build compares against it to find artifacts that are no longer produced.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, FolioResult};
use crate::fs::FileSystem;
use crate::hash::ContentHash;

pub const MANIFEST_FILE: &str = ".folio-manifest.toml";

const MANIFEST_VERSION: u32 = 1;

/// Normalize an artifact path for storage (always use forward slashes).
pub fn normalize_artifact_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Parse a stored artifact path back into a platform path.
///
/// Returns `None` for anything that would not stay inside the output
/// directory (`.`/`..` segments, drive prefixes, empty paths).
pub fn parse_artifact_path(s: &str) -> Option<PathBuf> {
    let segments: Vec<&str> = s.split('/').filter(|p| !p.is_empty()).collect();
    if segments.is_empty() || segments.iter().any(|p| *p == "." || *p == "..") {
        return None;
    }
    let path: PathBuf = segments.into_iter().collect();
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(path)
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlManifest {
    version: u32,
    #[serde(default)]
    files: BTreeMap<String, ContentHash>,
}

/// Artifact path (relative to the output dir) -> content hash
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    files: BTreeMap<String, ContentHash>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: &Path, hash: ContentHash) {
        self.files.insert(normalize_artifact_path(path), hash);
    }

    pub fn get(&self, path: &Path) -> Option<&ContentHash> {
        self.files.get(&normalize_artifact_path(path))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.files.keys().filter_map(|k| parse_artifact_path(k))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Load the manifest at `path`. A missing file is an empty manifest.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> FolioResult<Self> {
        if !fs.exists(path) {
            return Ok(Self::new());
        }

        let bytes = fs.read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let parsed: TomlManifest = toml::from_str(&content).map_err(|e| FolioError::Config {
            file: path.to_path_buf(),
            message: e.message().to_string(),
        })?;

        if parsed.version != MANIFEST_VERSION {
            return Err(FolioError::Config {
                file: path.to_path_buf(),
                message: format!(
                    "unsupported manifest version {} (expected {})",
                    parsed.version, MANIFEST_VERSION
                ),
            });
        }

        let files = parsed
            .files
            .into_iter()
            .filter(|(key, _)| {
                let contained = parse_artifact_path(key).is_some();
                if !contained {
                    tracing::warn!(path = %key, "ignoring manifest entry outside the output directory");
                }
                contained
            })
            .collect();

        Ok(Self { files })
    }

    /// Like `load`, but an unreadable manifest is logged and treated as empty.
    pub fn load_or_new(fs: &dyn FileSystem, path: &Path) -> Self {
        Self::load(fs, path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable build manifest");
            Self::new()
        })
    }

    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> FolioResult<()> {
        let manifest = TomlManifest {
            version: MANIFEST_VERSION,
            files: self.files.clone(),
        };
        let content = toml::to_string_pretty(&manifest).map_err(|e| FolioError::Config {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs.write(path, content.as_bytes())
            .map_err(|source| FolioError::ArtifactWrite {
                artifact: "manifest".to_string(),
                path: path.to_path_buf(),
                source,
            })
    }
}
