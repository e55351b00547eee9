//! Error types for Folio
//!
//! Library code returns [`FolioError`]; the binary wraps it in `anyhow`.
//! Every variant that originates from a document carries its id so the
//! operator can see which post broke the build.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Folio operations
pub type FolioResult<T> = Result<T, FolioError>;

/// Coarse classification used by the CLI and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Frontmatter,
    Template,
    Markup,
    Io,
    Config,
}

/// Main error type for Folio operations
#[derive(Error, Debug)]
pub enum FolioError {
    /// Content root (usually `_posts/`) does not exist
    #[error("content root not found: {path}")]
    ContentRootNotFound { path: PathBuf },

    /// No document derives the requested id
    #[error("document not found: {id}")]
    DocumentNotFound { id: String },

    /// Missing required front matter field
    #[error("missing required field '{field}' in {file}")]
    MissingField { field: String, file: PathBuf },

    /// No front matter found (missing `---` delimiters)
    #[error("no front matter found in {file} - file must start with '---'")]
    NoFrontmatter { file: PathBuf },

    /// Front matter not properly closed
    #[error("unclosed front matter in {file} - missing closing '---'")]
    UnclosedFrontmatter { file: PathBuf },

    /// Invalid front matter YAML
    #[error("invalid front matter in {file}: {message}")]
    InvalidFrontmatter { file: PathBuf, message: String },

    /// `date` value that none of the accepted formats match
    #[error("invalid date '{value}' in {file}")]
    InvalidDate { value: String, file: PathBuf },

    /// Two content files derive the same identifier
    #[error("duplicate document id '{id}': {first} and {second}")]
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Document (or index) references a layout that does not exist
    #[error("undefined layout '{layout}' referenced by {document}")]
    UndefinedLayout { layout: String, document: String },

    /// Layout chain refers back to itself
    #[error("layout cycle while rendering {document}: {}", chain.join(" -> "))]
    LayoutCycle { document: String, chain: Vec<String> },

    /// Tera failed to parse or evaluate a layout
    #[error("template error in layout '{layout}' ({document}): {message}")]
    Template {
        layout: String,
        document: String,
        message: String,
    },

    /// Body markup could not be parsed
    #[error("markup error in {document} at body line {line}: {message}")]
    Markup {
        document: String,
        line: usize,
        message: String,
    },

    /// Two artifacts would be written to the same output path
    #[error("output path '{path}' produced by both {first} and {second}")]
    OutputCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    /// Writing one artifact failed; remaining writes were aborted
    #[error("failed to write {artifact} to {path}: {source}")]
    ArtifactWrite {
        artifact: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration file
    #[error("invalid config {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FolioError {
    /// Classify the error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ContentRootNotFound { .. }
            | Self::DocumentNotFound { .. }
            | Self::MissingField { .. } => ErrorKind::NotFound,
            Self::NoFrontmatter { .. }
            | Self::UnclosedFrontmatter { .. }
            | Self::InvalidFrontmatter { .. }
            | Self::InvalidDate { .. }
            | Self::DuplicateId { .. } => ErrorKind::Frontmatter,
            Self::UndefinedLayout { .. } | Self::LayoutCycle { .. } | Self::Template { .. } => {
                ErrorKind::Template
            }
            Self::Markup { .. } => ErrorKind::Markup,
            Self::OutputCollision { .. } | Self::ArtifactWrite { .. } | Self::Io(_) => {
                ErrorKind::Io
            }
            Self::Config { .. } => ErrorKind::Config,
        }
    }
}
