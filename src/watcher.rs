//! Source watcher for `folio serve`
//!
//! Collects file notifications for the source directory and reports them
//! once no further change has arrived for `DEBOUNCE_MS`. Changes under the
//! output directory are ignored so a rebuild never triggers itself.

use std::collections::BTreeSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::FolioResult;
use crate::site::assets::IGNORE_FILE;

/// Debounce duration in milliseconds
pub const DEBOUNCE_MS: u64 = 100;

/// Pending changes awaiting the debounce window
#[derive(Debug, Default)]
pub(crate) struct WatcherState {
    pending_changes: BTreeSet<PathBuf>,
    last_change: Option<Instant>,
}

impl WatcherState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_change(&mut self, path: PathBuf) {
        self.pending_changes.insert(path);
        self.last_change = Some(Instant::now());
    }

    pub(crate) fn should_rebuild(&self) -> bool {
        match self.last_change {
            Some(last) => {
                !self.pending_changes.is_empty()
                    && last.elapsed() >= Duration::from_millis(DEBOUNCE_MS)
            }
            None => false,
        }
    }

    pub(crate) fn take_changes(&mut self) -> Vec<PathBuf> {
        self.last_change = None;
        std::mem::take(&mut self.pending_changes).into_iter().collect()
    }
}

/// Whether a change at `path` should trigger a rebuild.
///
/// Paths under `output` and hidden entries (editor swap files, `.git`) do
/// not, except `.folioignore` itself.
pub fn is_relevant(path: &Path, source: &Path, output: &Path) -> bool {
    if path.starts_with(output) {
        return false;
    }
    let relative = path.strip_prefix(source).unwrap_or(path);
    if relative == Path::new(IGNORE_FILE) {
        return true;
    }
    !relative.components().any(|c| match c {
        Component::Normal(name) => name.to_str().map(|n| n.starts_with('.') || n.ends_with('~')).unwrap_or(false),
        _ => false,
    })
}

/// Recursive watcher over a source directory
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<PathBuf>,
    source: PathBuf,
    output: PathBuf,
    state: WatcherState,
}

impl SourceWatcher {
    pub fn start(source: &Path, output: &Path) -> FolioResult<Self> {
        // notify reports canonical paths
        let source = source.canonicalize()?;
        let output = output.canonicalize().unwrap_or_else(|_| output.to_path_buf());

        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "file watch error"),
            },
            Config::default(),
        )
        .map_err(notify_error)?;

        watcher
            .watch(&source, RecursiveMode::Recursive)
            .map_err(notify_error)?;
        tracing::debug!(source = %source.display(), "watching for changes");

        Ok(Self {
            _watcher: watcher,
            rx,
            source,
            output,
            state: WatcherState::new(),
        })
    }

    /// Wait up to `timeout` for notifications.
    ///
    /// Returns the changed paths once the debounce window has passed.
    pub fn poll(&mut self, timeout: Duration) -> Option<Vec<PathBuf>> {
        if let Ok(path) = self.rx.recv_timeout(timeout) {
            self.record(path);
            while let Ok(path) = self.rx.try_recv() {
                self.record(path);
            }
        }

        if self.state.should_rebuild() {
            Some(self.state.take_changes())
        } else {
            None
        }
    }

    fn record(&mut self, path: PathBuf) {
        if is_relevant(&path, &self.source, &self.output) {
            tracing::trace!(path = %path.display(), "source changed");
            self.state.add_change(path);
        }
    }
}

fn notify_error(e: notify::Error) -> io::Error {
    io::Error::other(e.to_string())
}
