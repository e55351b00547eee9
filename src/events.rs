//! Build events
//!
//! The assembler reports progress through a `BuildEventSink`. The CLI picks
//! `JsonEventSink` for `--json` (NDJSON on stdout) and `LogEventSink`
//! otherwise.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// Events emitted during a build or clean
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// Build started
    Started { source: PathBuf, output: PathBuf },

    /// All artifacts rendered in memory
    Rendered {
        documents: usize,
        indexes: usize,
        assets: usize,
    },

    /// Artifact content changed and was written
    ArtifactWritten { artifact: String, path: PathBuf },

    /// Artifact content matched what was on disk
    ArtifactUnchanged { artifact: String, path: PathBuf },

    /// Artifact from a previous build removed
    ArtifactRemoved { path: PathBuf },

    /// Build completed
    Completed {
        written: usize,
        unchanged: usize,
        removed: usize,
    },
}

/// Receiver of build events
pub trait BuildEventSink: Send + Sync {
    fn on_event(&self, event: BuildEvent);
}

/// Silent sink
#[derive(Debug, Default)]
pub struct NoopEventSink;

impl BuildEventSink for NoopEventSink {
    fn on_event(&self, _event: BuildEvent) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Default)]
pub struct LogEventSink;

impl BuildEventSink for LogEventSink {
    fn on_event(&self, event: BuildEvent) {
        match event {
            BuildEvent::Started { source, output } => {
                tracing::info!(source = %source.display(), output = %output.display(), "building site");
            }
            BuildEvent::Rendered {
                documents,
                indexes,
                assets,
            } => {
                tracing::debug!(documents, indexes, assets, "rendered artifacts");
            }
            BuildEvent::ArtifactWritten { artifact, path } => {
                tracing::debug!(%artifact, path = %path.display(), "wrote");
            }
            BuildEvent::ArtifactUnchanged { artifact, path } => {
                tracing::trace!(%artifact, path = %path.display(), "unchanged");
            }
            BuildEvent::ArtifactRemoved { path } => {
                tracing::debug!(path = %path.display(), "removed stale artifact");
            }
            BuildEvent::Completed {
                written,
                unchanged,
                removed,
            } => {
                tracing::info!(written, unchanged, removed, "build complete");
            }
        }
    }
}

/// Writes one JSON object per event
pub struct JsonEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

impl BuildEventSink for JsonEventSink {
    fn on_event(&self, event: BuildEvent) {
        let json = match event {
            BuildEvent::Started { source, output } => serde_json::json!({
                "event": "start",
                "source": source.display().to_string(),
                "output": output.display().to_string(),
            }),
            BuildEvent::Rendered {
                documents,
                indexes,
                assets,
            } => serde_json::json!({
                "event": "rendered",
                "documents": documents,
                "indexes": indexes,
                "assets": assets,
            }),
            BuildEvent::ArtifactWritten { artifact, path } => serde_json::json!({
                "event": "written",
                "artifact": artifact,
                "path": path.display().to_string(),
            }),
            BuildEvent::ArtifactUnchanged { artifact, path } => serde_json::json!({
                "event": "unchanged",
                "artifact": artifact,
                "path": path.display().to_string(),
            }),
            BuildEvent::ArtifactRemoved { path } => serde_json::json!({
                "event": "removed",
                "path": path.display().to_string(),
            }),
            BuildEvent::Completed {
                written,
                unchanged,
                removed,
            } => serde_json::json!({
                "event": "complete",
                "status": "success",
                "written": written,
                "unchanged": unchanged,
                "removed": removed,
            }),
        };
        self.write_event(json);
    }
}
