//! Site assembler
//!
//! A build runs in two phases. First every artifact (documents, index
//! pages, static assets) is rendered in memory; any error here aborts
//! before anything touches the output directory. Then changed artifacts are
//! written, artifacts left over from the previous build are removed, and
//! the manifest is updated.

pub mod assets;
mod index;
mod manifest;

pub use index::{listing_order, IndexGroup, SiteIndex};
pub use manifest::{Manifest, MANIFEST_FILE};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{FolioError, FolioResult};
use crate::events::{BuildEvent, BuildEventSink};
use crate::fs::FileSystem;
use crate::hash::ContentHash;
use crate::permalink::output_path;
use crate::render::{LayoutSet, Listing, Renderer};
use crate::store::ContentStore;

use assets::IgnorePatterns;

/// One output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Document id, `home`, `category:<slug>`, `tag:<slug>` or `asset:<path>`
    pub id: String,
    /// Path relative to the output directory
    pub path: PathBuf,
    pub content: Vec<u8>,
}

/// Everything a build would write
#[derive(Debug, Clone, Default)]
pub struct RenderedSite {
    pub artifacts: Vec<Artifact>,
    pub documents: usize,
    pub indexes: usize,
    pub assets: usize,
}

/// Result of a successful build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub documents: usize,
    pub indexes: usize,
    pub assets: usize,
    /// Output paths written this build
    pub written: Vec<PathBuf>,
    pub unchanged: usize,
    /// Output paths of stale artifacts removed this build
    pub removed: Vec<PathBuf>,
}

/// A source directory plus the configuration used to build it
#[derive(Debug, Clone)]
pub struct Site {
    source: PathBuf,
    config: Config,
}

impl Site {
    pub fn new(source: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            source: source.into(),
            config,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir(&self.source)
    }

    fn manifest_path(&self) -> PathBuf {
        self.output_dir().join(MANIFEST_FILE)
    }

    /// Render every artifact in memory.
    pub fn render(&self) -> FolioResult<RenderedSite> {
        let documents = ContentStore::open(self.config.posts_dir(&self.source)).list()?;
        let layouts = LayoutSet::load(&self.config.layouts_dir(&self.source))?;
        let renderer = Renderer::new(
            layouts,
            self.config.site.clone(),
            self.config.build.permalink.clone(),
        );

        let mut rendered = RenderedSite::default();

        for doc in &documents {
            let page = renderer.render(doc)?;
            rendered.artifacts.push(Artifact {
                id: page.id,
                path: output_path(&page.url),
                content: page.html.into_bytes(),
            });
            rendered.documents += 1;
        }

        let index = SiteIndex::build(&documents);
        for listing in self.listings(&renderer, &index) {
            let html = renderer.render_listing(&listing, self.config.indexes.layout.as_deref())?;
            rendered.artifacts.push(Artifact {
                path: output_path(&listing.url),
                id: listing.id,
                content: html.into_bytes(),
            });
            rendered.indexes += 1;
        }

        let output = self.output_dir();
        let ignore = IgnorePatterns::load(&self.source)?;
        for asset in assets::collect(&self.source, &output, &ignore)? {
            let content = std::fs::read(&asset.source)?;
            rendered.artifacts.push(Artifact {
                id: format!("asset:{}", manifest::normalize_artifact_path(&asset.relative)),
                path: asset.relative,
                content,
            });
            rendered.assets += 1;
        }

        check_collisions(&rendered.artifacts, &output)?;
        Ok(rendered)
    }

    fn listings(&self, renderer: &Renderer, index: &SiteIndex<'_>) -> Vec<Listing> {
        let indexes = &self.config.indexes;
        let mut listings = Vec::new();

        if indexes.home {
            listings.push(Listing {
                id: "home".to_string(),
                title: self.config.site.title.clone(),
                url: "/".to_string(),
                entries: index.all.iter().map(|d| renderer.entry_for(d)).collect(),
            });
        }

        let groups = [
            (indexes.categories, "category", "categories", &index.categories),
            (indexes.tags, "tag", "tags", &index.tags),
        ];
        for (enabled, kind, dir, groups) in groups {
            if !enabled {
                continue;
            }
            for group in groups.values() {
                listings.push(Listing {
                    id: format!("{}:{}", kind, group.slug),
                    title: group.name.clone(),
                    url: format!("/{}/{}/", dir, group.slug),
                    entries: group.documents.iter().map(|d| renderer.entry_for(d)).collect(),
                });
            }
        }

        listings
    }

    /// Build the site into the output directory.
    pub fn build(&self, fs: &dyn FileSystem, events: &dyn BuildEventSink) -> FolioResult<BuildReport> {
        let output = self.output_dir();
        events.on_event(BuildEvent::Started {
            source: self.source.clone(),
            output: output.clone(),
        });

        let rendered = self.render()?;
        events.on_event(BuildEvent::Rendered {
            documents: rendered.documents,
            indexes: rendered.indexes,
            assets: rendered.assets,
        });

        let manifest_path = self.manifest_path();
        let previous = Manifest::load_or_new(fs, &manifest_path);
        fs.create_dir_all(&output)?;

        let mut report = BuildReport {
            documents: rendered.documents,
            indexes: rendered.indexes,
            assets: rendered.assets,
            ..BuildReport::default()
        };
        let mut manifest = Manifest::new();

        for artifact in rendered.artifacts {
            let target = output.join(&artifact.path);
            let hash = ContentHash::from_bytes(&artifact.content);

            let unchanged = fs.exists(&target)
                && fs.hash(&target).map(|h| h == hash).unwrap_or(false);
            if unchanged {
                report.unchanged += 1;
                events.on_event(BuildEvent::ArtifactUnchanged {
                    artifact: artifact.id,
                    path: artifact.path.clone(),
                });
            } else {
                fs.write(&target, &artifact.content)
                    .map_err(|source| FolioError::ArtifactWrite {
                        artifact: artifact.id.clone(),
                        path: target.clone(),
                        source,
                    })?;
                report.written.push(artifact.path.clone());
                events.on_event(BuildEvent::ArtifactWritten {
                    artifact: artifact.id,
                    path: artifact.path.clone(),
                });
            }
            manifest.set(&artifact.path, hash);
        }

        for stale in previous.paths().filter(|p| !manifest.contains(p)) {
            if remove_artifact(fs, &output, &stale)? {
                events.on_event(BuildEvent::ArtifactRemoved {
                    path: stale.clone(),
                });
                report.removed.push(stale);
            }
        }

        if manifest != previous || !fs.exists(&manifest_path) {
            manifest.save(fs, &manifest_path)?;
        }

        events.on_event(BuildEvent::Completed {
            written: report.written.len(),
            unchanged: report.unchanged,
            removed: report.removed.len(),
        });
        Ok(report)
    }

    /// Remove every artifact recorded in the manifest, then the manifest.
    ///
    /// Files in the output directory that a build did not produce are left
    /// alone.
    pub fn clean(&self, fs: &dyn FileSystem, events: &dyn BuildEventSink) -> FolioResult<Vec<PathBuf>> {
        let output = self.output_dir();
        events.on_event(BuildEvent::Started {
            source: self.source.clone(),
            output: output.clone(),
        });

        let manifest_path = self.manifest_path();
        let manifest = Manifest::load_or_new(fs, &manifest_path);

        let mut removed = Vec::new();
        for path in manifest.paths() {
            if remove_artifact(fs, &output, &path)? {
                events.on_event(BuildEvent::ArtifactRemoved { path: path.clone() });
                removed.push(path);
            }
        }

        if fs.exists(&manifest_path) {
            fs.remove(&manifest_path)?;
        }
        fs.remove_dir_if_empty(&output)?;

        events.on_event(BuildEvent::Completed {
            written: 0,
            unchanged: 0,
            removed: removed.len(),
        });
        Ok(removed)
    }
}

/// Two artifacts may not share an output path.
fn check_collisions(artifacts: &[Artifact], output: &Path) -> FolioResult<()> {
    let mut seen: BTreeMap<&Path, &str> = BTreeMap::new();
    for artifact in artifacts {
        if artifact.path == Path::new(MANIFEST_FILE) {
            return Err(FolioError::OutputCollision {
                path: output.join(&artifact.path),
                first: "manifest".to_string(),
                second: artifact.id.clone(),
            });
        }
        if let Some(first) = seen.insert(&artifact.path, &artifact.id) {
            return Err(FolioError::OutputCollision {
                path: output.join(&artifact.path),
                first: first.to_string(),
                second: artifact.id.clone(),
            });
        }
    }
    Ok(())
}

/// Remove `output/relative` if present and prune directories it leaves empty.
fn remove_artifact(fs: &dyn FileSystem, output: &Path, relative: &Path) -> FolioResult<bool> {
    let target = output.join(relative);
    if !fs.exists(&target) {
        return Ok(false);
    }
    fs.remove(&target)?;

    let mut dir = target.parent();
    while let Some(current) = dir {
        if current == output || !current.starts_with(output) {
            break;
        }
        if !fs.remove_dir_if_empty(current)? {
            break;
        }
        dir = current.parent();
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::events::NoopEventSink;
    use crate::fs::{LocalFs, MockFileSystem};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "_layouts/post.html", "<article>{{ content }}</article>");
        write(
            root,
            "_posts/2015-02-28-unit-testing.md",
            "---\nlayout: post\ntitle: Unit testing\ncategories: [clojure]\ntags: [tdd]\n---\n{% highlight clojure %}\n(is (= 4 (+ 2 2)))\n{% endhighlight %}\n",
        );
        write(
            root,
            "_posts/2015-03-01-macros.md",
            "---\nlayout: post\ntitle: Macros\ncategories: [clojure]\n---\nBody\n",
        );
        write(root, "css/site.css", "body {}");
        dir
    }

    fn site(dir: &TempDir) -> Site {
        Site::new(dir.path(), Config::default())
    }

    fn out(dir: &TempDir, rel: &str) -> PathBuf {
        dir.path().join("_site").join(rel)
    }

    #[test]
    fn build_writes_documents_indexes_and_assets() {
        let dir = fixture();
        let fs = MockFileSystem::new();

        let report = site(&dir).build(&fs, &NoopEventSink).unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.indexes, 3); // home, category:clojure, tag:tdd
        assert_eq!(report.assets, 1);
        assert_eq!(report.unchanged, 0);

        let post = fs
            .get(&out(&dir, "clojure/2015/02/28/unit-testing.html"))
            .unwrap();
        assert!(post.starts_with("<article>"));
        assert!(post.contains("(is (= 4 (+ 2 2)))"));

        let category = fs.get(&out(&dir, "categories/clojure/index.html")).unwrap();
        let newer = category.find("Macros").unwrap();
        let older = category.find("Unit testing").unwrap();
        assert!(newer < older);

        assert!(fs.get(&out(&dir, "tags/tdd/index.html")).is_some());
        assert_eq!(fs.get(&out(&dir, "css/site.css")).unwrap(), "body {}");
        assert!(fs.get(&out(&dir, MANIFEST_FILE)).is_some());
    }

    #[test]
    fn second_build_writes_nothing() {
        let dir = fixture();
        let fs = MockFileSystem::new();
        let site = site(&dir);

        let first = site.build(&fs, &NoopEventSink).unwrap();
        let second = site.build(&fs, &NoopEventSink).unwrap();

        assert!(second.written.is_empty());
        assert_eq!(second.unchanged, first.written.len());
        assert!(second.removed.is_empty());
    }

    #[test]
    fn render_error_aborts_before_writing() {
        let dir = fixture();
        write(
            dir.path(),
            "_posts/2015-03-02-broken.md",
            "---\nlayout: nope\ntitle: Broken\n---\n",
        );
        let fs = MockFileSystem::new();

        let err = site(&dir).build(&fs, &NoopEventSink).unwrap_err();
        assert!(matches!(err, FolioError::UndefinedLayout { ref layout, .. } if layout == "nope"));
        assert!(fs.paths().is_empty());
    }

    #[test]
    fn write_failure_aborts_remaining_writes() {
        let dir = fixture();
        let failing = out(&dir, "clojure/2015/02/28/unit-testing.html");
        let fs = MockFileSystem::failing_on(&failing);

        let err = site(&dir).build(&fs, &NoopEventSink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(matches!(
            err,
            FolioError::ArtifactWrite { ref artifact, ref path, .. }
                if artifact == "2015-02-28-unit-testing" && path == &failing
        ));
        assert!(fs.get(&out(&dir, "index.html")).is_none());
        assert!(fs.get(&out(&dir, MANIFEST_FILE)).is_none());
    }

    #[test]
    fn removed_document_disappears_with_its_empty_indexes() {
        let dir = fixture();
        let fs = LocalFs::new();
        let site = site(&dir);
        site.build(&fs, &NoopEventSink).unwrap();
        assert!(out(&dir, "tags/tdd/index.html").exists());

        fs::remove_file(dir.path().join("_posts/2015-02-28-unit-testing.md")).unwrap();
        let report = site.build(&fs, &NoopEventSink).unwrap();

        assert!(!out(&dir, "clojure/2015/02/28/unit-testing.html").exists());
        assert!(!out(&dir, "clojure/2015/02/28").exists());
        assert!(!out(&dir, "tags/tdd").exists());
        assert!(out(&dir, "clojure/2015/03/01/macros.html").exists());

        let category = fs::read_to_string(out(&dir, "categories/clojure/index.html")).unwrap();
        assert!(!category.contains("Unit testing"));
        let home = fs::read_to_string(out(&dir, "index.html")).unwrap();
        assert!(!home.contains("Unit testing"));

        assert_eq!(report.removed.len(), 2);
    }

    #[test]
    fn disabled_indexes_are_not_built() {
        let dir = fixture();
        let mut config = Config::default();
        config.indexes.categories = false;
        config.indexes.tags = false;
        let fs = MockFileSystem::new();

        let report = Site::new(dir.path(), config).build(&fs, &NoopEventSink).unwrap();
        assert_eq!(report.indexes, 1);
        assert!(fs.get(&out(&dir, "categories/clojure/index.html")).is_none());
    }

    #[test]
    fn index_layout_wraps_listings() {
        let dir = fixture();
        write(dir.path(), "_layouts/index.html", "<main>{{ content }}</main>");
        let mut config = Config::default();
        config.indexes.layout = Some("index".into());
        let fs = MockFileSystem::new();

        Site::new(dir.path(), config).build(&fs, &NoopEventSink).unwrap();
        let home = fs.get(&out(&dir, "index.html")).unwrap();
        assert!(home.starts_with("<main><h1>Untitled</h1>"));
    }

    #[test]
    fn colliding_outputs_are_rejected() {
        let dir = fixture();
        write(dir.path(), "index.html", "<p>custom home</p>");
        let fs = MockFileSystem::new();

        let err = site(&dir).build(&fs, &NoopEventSink).unwrap_err();
        assert!(matches!(
            err,
            FolioError::OutputCollision { ref first, ref second, .. }
                if first == "home" && second == "asset:index.html"
        ));
        assert!(fs.paths().is_empty());
    }

    #[test]
    fn clean_removes_built_artifacts_only() {
        let dir = fixture();
        let fs = LocalFs::new();
        let site = site(&dir);
        site.build(&fs, &NoopEventSink).unwrap();
        write(dir.path(), "_site/keep.txt", "mine");

        let removed = site.clean(&fs, &NoopEventSink).unwrap();
        assert_eq!(removed.len(), 6);
        assert!(!out(&dir, "index.html").exists());
        assert!(!out(&dir, MANIFEST_FILE).exists());
        assert!(out(&dir, "keep.txt").exists());
    }

    #[test]
    fn clean_never_leaves_the_output_directory() {
        let dir = fixture();
        let fs = LocalFs::new();
        write(dir.path(), "precious.txt", "keep me");
        write(
            dir.path(),
            &format!("_site/{MANIFEST_FILE}"),
            "version = 1\n\n[files]\n\"../precious.txt\" = \"sha256:00\"\n",
        );

        let removed = site(&dir).clean(&fs, &NoopEventSink).unwrap();
        assert!(removed.is_empty());
        assert!(dir.path().join("precious.txt").exists());
    }

    #[test]
    fn clean_without_build_is_noop() {
        let dir = fixture();
        let removed = site(&dir).clean(&MockFileSystem::new(), &NoopEventSink).unwrap();
        assert!(removed.is_empty());
    }
}
