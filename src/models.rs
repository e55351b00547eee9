//! Core data models for Folio
//!
//! - `FrontMatter`: YAML metadata as written in a source file
//! - `Document`: a parsed post with resolved metadata and body
//! - `MarkupFormat`: how the body is turned into HTML

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Markup language of a document body, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupFormat {
    Markdown,
    Html,
}

impl MarkupFormat {
    /// Detect the format from a path; `None` means "not a document".
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") | Some("markdown") => Some(Self::Markdown),
            Some("html") | Some("htm") => Some(Self::Html),
            _ => None,
        }
    }
}

/// A list of names that YAML authors may write either as a sequence or as a
/// whitespace-separated string (`categories: clojure testing`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringListDe {
    Empty,
    Many(Vec<Scalar>),
    One(Scalar),
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let items = match StringListDe::deserialize(deserializer)? {
            StringListDe::Empty => Vec::new(),
            StringListDe::Many(items) => items
                .into_iter()
                .map(Scalar::into_string)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            StringListDe::One(Scalar::Str(s)) => {
                s.split_whitespace().map(str::to_string).collect()
            }
            StringListDe::One(other) => vec![other.into_string()],
        };
        Ok(Self(items))
    }
}

/// YAML front matter as written by the author.
///
/// Required fields (`layout`, `title`, and usually `date`) are optional here
/// so the parser can report exactly which one is missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub layout: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// Raw date string, resolved by `parser::parse_date`
    #[serde(default, deserialize_with = "deserialize_date_string")]
    pub date: Option<String>,

    #[serde(default)]
    pub categories: StringList,

    #[serde(default)]
    pub category: StringList,

    #[serde(default)]
    pub tags: StringList,

    #[serde(default)]
    pub tag: StringList,

    /// `false` keeps the document out of the build
    #[serde(default)]
    pub published: Option<bool>,

    /// Per-document permalink pattern
    #[serde(default)]
    pub permalink: Option<String>,

    /// Everything else, handed to layouts as `page.extra`
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml_ng::Value>,
}

fn deserialize_date_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

impl FrontMatter {
    /// Merged `categories` + `category`, deduplicated, order preserved.
    pub fn all_categories(&self) -> Vec<String> {
        merge_unique(&self.categories.0, &self.category.0)
    }

    /// Merged `tags` + `tag`, deduplicated, order preserved.
    pub fn all_tags(&self) -> Vec<String> {
        merge_unique(&self.tags.0, &self.tag.0)
    }

    pub fn is_published(&self) -> bool {
        self.published.unwrap_or(true)
    }
}

fn merge_unique(a: &[String], b: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(a.len() + b.len());
    for item in a.iter().chain(b) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// A parsed document with resolved metadata and body
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Unique identifier (filename stem, e.g. `2015-02-28-unit-testing`)
    pub id: String,

    /// Id without its date prefix
    pub slug: String,

    /// Source file path relative to the content root
    pub source_path: PathBuf,

    pub title: String,

    /// Name of the layout wrapping this document
    pub layout: String,

    /// Publication date-time as written by the author
    pub date: NaiveDateTime,

    pub categories: Vec<String>,

    pub tags: Vec<String>,

    pub permalink: Option<String>,

    pub extra: BTreeMap<String, serde_yaml_ng::Value>,

    pub format: MarkupFormat,

    /// Body markup (after front matter)
    pub body: String,
}

impl Document {
    /// Create a Markdown document with no categories or tags.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        layout: impl Into<String>,
        date: NaiveDateTime,
        body: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let slug = crate::parser::split_date_prefix(&id).1.to_string();
        Self {
            source_path: PathBuf::from(format!("{id}.md")),
            id,
            slug,
            title: title.into(),
            layout: layout.into(),
            date,
            categories: Vec::new(),
            tags: Vec::new(),
            permalink: None,
            extra: BTreeMap::new(),
            format: MarkupFormat::Markdown,
            body: body.into(),
        }
    }

    pub fn with_categories<S: Into<String>>(mut self, categories: impl IntoIterator<Item = S>) -> Self {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}
