//! Folio - static blog builder
//!
//! Folio reads front-matter posts from a content root, renders them through
//! named layouts, derives category and tag indexes, and writes the result
//! as a static site.

pub mod config;
pub mod error;
pub mod events;
pub mod fs;
pub mod hash;
pub mod models;
pub mod parser;
pub mod permalink;
pub mod render;
pub mod serve;
pub mod site;
pub mod store;
pub mod watcher;

// Re-exports for convenience
pub use config::{Config, ConfigWarning};
pub use error::{ErrorKind, FolioError, FolioResult};
pub use events::{BuildEvent, BuildEventSink, JsonEventSink, LogEventSink, NoopEventSink};
pub use fs::{FileSystem, LocalFs};
pub use models::{Document, FrontMatter, MarkupFormat};
pub use parser::{parse_document, parse_frontmatter};
pub use render::{LayoutSet, RenderedPage, Renderer};
pub use serve::{serve, ServeOptions};
pub use site::{BuildReport, Site, SiteIndex};
pub use store::ContentStore;
