//! Static assets - files copied verbatim into the output
//!
//! Everything under the source root is an asset unless it sits under an
//! `_`- or `.`-prefixed path, is the config file, or matches a pattern in
//! `.folioignore` (gitignore syntax).

use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::config::CONFIG_FILE;
use crate::error::{FolioError, FolioResult};

pub const IGNORE_FILE: &str = ".folioignore";

/// Maximum size of `.folioignore` (64KB)
const MAX_IGNORE_FILE_SIZE: u64 = 65536;

/// Patterns loaded from `.folioignore`
#[derive(Debug)]
pub struct IgnorePatterns {
    matcher: Gitignore,
    pattern_count: usize,
}

impl IgnorePatterns {
    /// Matches nothing.
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
            pattern_count: 0,
        }
    }

    /// Load `.folioignore` from `source`. A missing file matches nothing.
    pub fn load(source: &Path) -> FolioResult<Self> {
        let path = source.join(IGNORE_FILE);
        if !path.is_file() {
            return Ok(Self::empty());
        }

        let size = fs::metadata(&path)?.len();
        if size > MAX_IGNORE_FILE_SIZE {
            return Err(FolioError::Config {
                file: path,
                message: format!(
                    "exceeds {}KB limit ({} bytes)",
                    MAX_IGNORE_FILE_SIZE / 1024,
                    size
                ),
            });
        }

        let content = fs::read_to_string(&path)?;
        Self::from_content(source, &path, &content)
    }

    pub fn from_content(root: &Path, file: &Path, content: &str) -> FolioResult<Self> {
        let mut builder = GitignoreBuilder::new(root);
        let mut pattern_count = 0;

        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            pattern_count += 1;

            builder
                .add_line(Some(file.to_path_buf()), line)
                .map_err(|e| FolioError::Config {
                    file: file.to_path_buf(),
                    message: format!("line {}: invalid pattern '{}': {}", line_num + 1, trimmed, e),
                })?;
        }

        let matcher = builder.build().map_err(|e| FolioError::Config {
            file: file.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Self {
            matcher,
            pattern_count,
        })
    }

    pub fn is_ignored(&self, rel_path: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }
}

/// A file to copy into the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    pub source: PathBuf,
    /// Path relative to both the source root and the output root
    pub relative: PathBuf,
}

/// Collect the static assets under `source`, in sorted order.
///
/// `output` is skipped even when its name carries no `_` prefix.
pub fn collect(source: &Path, output: &Path, ignore: &IgnorePatterns) -> FolioResult<Vec<StaticAsset>> {
    let mut assets = Vec::new();
    walk(source, source, output, ignore, &mut assets)?;
    assets.sort_by(|a, b| a.relative.cmp(&b.relative));
    tracing::debug!(count = assets.len(), ignore_patterns = ignore.pattern_count(), "collected static assets");
    Ok(assets)
}

fn walk(
    root: &Path,
    current: &Path,
    output: &Path,
    ignore: &IgnorePatterns,
    assets: &mut Vec<StaticAsset>,
) -> FolioResult<()> {
    for entry in fs::read_dir(current)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('_') || name.starts_with('.') || path == output {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root).map(Path::to_path_buf) else {
            continue;
        };
        let is_dir = path.is_dir();
        if ignore.is_ignored(&relative, is_dir) {
            tracing::trace!(path = %relative.display(), "ignored by {}", IGNORE_FILE);
            continue;
        }

        if is_dir {
            walk(root, &path, output, ignore, assets)?;
        } else if relative != Path::new(CONFIG_FILE) {
            assets.push(StaticAsset {
                source: path,
                relative,
            });
        }
    }
    Ok(())
}
