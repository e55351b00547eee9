//! Source parser for content files
//!
//! Handles extraction and parsing of YAML front matter and resolves it into
//! a [`Document`].

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{FolioError, FolioResult};
use crate::models::{Document, FrontMatter, MarkupFormat};

/// Delimiter for front matter sections
const FRONTMATTER_DELIMITER: &str = "---";

/// Naive date-time layouts accepted in the `date` field
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Layouts carrying a trailing `±HHMM` offset
const OFFSET_DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"];

/// Result of extracting front matter from content
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFrontmatter {
    /// The raw YAML content of the front matter
    pub yaml: String,
    /// The content body after the front matter
    pub body: String,
    /// Line number where front matter ends (for error reporting)
    pub end_line: usize,
}

/// Extract front matter from file content
///
/// Front matter must be at the start of the file, delimited by `---` lines.
///
/// # Example
/// ```text
/// ---
/// layout: post
/// title: Unit testing in Clojure
/// ---
/// Body here
/// ```
pub fn extract_frontmatter(content: &str, file: &Path) -> FolioResult<ExtractedFrontmatter> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.is_empty() || lines[0].trim() != FRONTMATTER_DELIMITER {
        return Err(FolioError::NoFrontmatter {
            file: file.to_path_buf(),
        });
    }

    let closing_line = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim() == FRONTMATTER_DELIMITER)
        .map(|(i, _)| i)
        .ok_or_else(|| FolioError::UnclosedFrontmatter {
            file: file.to_path_buf(),
        })?;

    let yaml = lines[1..closing_line].join("\n");
    let body = if closing_line + 1 < lines.len() {
        lines[closing_line + 1..].join("\n")
    } else {
        String::new()
    };

    Ok(ExtractedFrontmatter {
        yaml,
        body,
        end_line: closing_line + 1,
    })
}

/// Parse front matter YAML into a [`FrontMatter`]
///
/// An empty block is valid and yields all defaults.
pub fn parse_frontmatter(yaml: &str, file: &Path) -> FolioResult<FrontMatter> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml_ng::from_str(yaml).map_err(|e| FolioError::InvalidFrontmatter {
        file: file.to_path_buf(),
        message: format_yaml_frontmatter_error(yaml, &e),
    })
}

/// Parse a `date` value in any of the accepted layouts.
///
/// The wall-clock time is kept as written; an explicit offset is parsed but
/// not applied.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in OFFSET_DATE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_local());
        }
    }
    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Split a `YYYY-MM-DD-` prefix off a file stem.
///
/// Returns the parsed date (if any) and the remainder.
pub fn split_date_prefix(stem: &str) -> (Option<NaiveDate>, &str) {
    let (Some(prefix), Some(rest)) = (stem.get(..10), stem.get(10..)) else {
        return (None, stem);
    };
    match (NaiveDate::parse_from_str(prefix, "%Y-%m-%d"), rest.strip_prefix('-')) {
        (Ok(date), Some(slug)) if !slug.is_empty() => (Some(date), slug),
        _ => (None, stem),
    }
}

/// Derive a document id from its file path
///
/// Converts `_posts/2015-02-28-unit-testing.md` to `2015-02-28-unit-testing`.
pub fn derive_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Build a [`Document`] from raw file content.
///
/// `relative` is the path reported in errors and stored on the document.
pub fn parse_document(content: &str, relative: &Path) -> FolioResult<Document> {
    let extracted = extract_frontmatter(content, relative)?;
    let fm = parse_frontmatter(&extracted.yaml, relative)?;
    resolve_document(fm, extracted.body, relative)
}

fn resolve_document(fm: FrontMatter, body: String, relative: &Path) -> FolioResult<Document> {
    let id = derive_id(relative);
    let (prefix_date, slug) = split_date_prefix(&id);
    let slug = slug.to_string();

    let missing = |field: &str| FolioError::MissingField {
        field: field.to_string(),
        file: relative.to_path_buf(),
    };

    let title = fm
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| missing("title"))?;
    let layout = fm
        .layout
        .clone()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| missing("layout"))?;

    let date = match &fm.date {
        Some(raw) => parse_date(raw).ok_or_else(|| FolioError::InvalidDate {
            value: raw.clone(),
            file: relative.to_path_buf(),
        })?,
        None => prefix_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| missing("date"))?,
    };

    let format = MarkupFormat::from_path(relative).unwrap_or(MarkupFormat::Markdown);

    Ok(Document {
        categories: fm.all_categories(),
        tags: fm.all_tags(),
        permalink: fm.permalink.clone(),
        extra: fm.extra,
        id,
        slug,
        source_path: relative.to_path_buf(),
        title,
        layout,
        date,
        format,
        body,
    })
}

/// Parse a single content file
///
/// Returns `Ok(None)` when the file is marked `published: false`.
pub fn parse_file(path: &Path, root: &Path) -> FolioResult<Option<Document>> {
    let content = fs::read_to_string(path)?;
    let relative = path.strip_prefix(root).unwrap_or(path);

    let extracted = extract_frontmatter(&content, relative)?;
    let fm = parse_frontmatter(&extracted.yaml, relative)?;
    if !fm.is_published() {
        tracing::debug!(file = %relative.display(), "skipping unpublished document");
        return Ok(None);
    }

    resolve_document(fm, extracted.body, relative).map(Some)
}

fn format_yaml_frontmatter_error(yaml: &str, err: &serde_yaml_ng::Error) -> String {
    let mut message = String::new();

    let err_str = err.to_string();
    match err.location() {
        Some(loc) => message.push_str(&format!("Line {}: Invalid YAML - {}", loc.line(), err_str)),
        None => message.push_str(&format!("Invalid YAML - {}", err_str)),
    }

    if should_hint_colon_quotes(yaml, &err_str) {
        message.push_str("\nHint: Strings with colons need quotes: title: \"Testing: a rant\"");
    }

    message
}

fn should_hint_colon_quotes(yaml: &str, err_str: &str) -> bool {
    // Common YAML failure when unquoted scalars contain `: `.
    err_str.contains("mapping values are not allowed")
        || err_str.contains("unexpected ':'")
        || yaml
            .lines()
            .any(|l| l.matches(": ").count() > 1 && !l.contains('"'))
}
