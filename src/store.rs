//! Content store
//!
//! Enumerates the documents under a content root (usually `_posts/`).
//! Reading is side-effect free: nothing here writes to disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FolioError, FolioResult};
use crate::models::{Document, MarkupFormat};
use crate::parser::{derive_id, parse_file};

/// Directory of front-matter documents
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all published documents, sorted by id.
    ///
    /// Fails if the content root is absent, if any document cannot be parsed,
    /// or if two files derive the same id.
    pub fn list(&self) -> FolioResult<Vec<Document>> {
        let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut documents = Vec::new();

        for path in self.document_paths()? {
            let Some(doc) = parse_file(&path, &self.root)? else {
                continue;
            };
            if let Some(first) = seen.insert(doc.id.clone(), doc.source_path.clone()) {
                return Err(FolioError::DuplicateId {
                    id: doc.id,
                    first,
                    second: doc.source_path,
                });
            }
            documents.push(doc);
        }

        documents.sort_by(|a, b| a.id.cmp(&b.id));
        tracing::debug!(root = %self.root.display(), count = documents.len(), "listed documents");
        Ok(documents)
    }

    /// Fetch a single document by id.
    ///
    /// Unpublished documents are reported as not found.
    pub fn get(&self, id: &str) -> FolioResult<Document> {
        let not_found = || FolioError::DocumentNotFound { id: id.to_string() };

        let path = self
            .document_paths()?
            .into_iter()
            .find(|p| derive_id(p) == id)
            .ok_or_else(not_found)?;

        parse_file(&path, &self.root)?.ok_or_else(not_found)
    }

    /// Every candidate document file under the root, in sorted order.
    fn document_paths(&self) -> FolioResult<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(FolioError::ContentRootNotFound {
                path: self.root.clone(),
            });
        }

        let mut paths = Vec::new();
        collect_document_paths(&self.root, &mut paths)?;
        paths.sort();
        Ok(paths)
    }
}

fn collect_document_paths(current: &Path, paths: &mut Vec<PathBuf>) -> FolioResult<()> {
    for entry in fs::read_dir(current)? {
        let path = entry?.path();

        if is_hidden(&path) {
            continue;
        }

        if path.is_dir() {
            collect_document_paths(&path, paths)?;
        } else if MarkupFormat::from_path(&path).is_some()
            && path.file_name() != Some(std::ffi::OsStr::new("README.md"))
        {
            paths.push(path);
        }
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
