//! Permalink expansion and URL helpers
//!
//! Turns a pattern such as `/:categories/:year/:month/:day/:slug.html` into
//! a document URL, and a URL into the output path relative to the site root.

use std::path::PathBuf;

use crate::models::Document;

/// Slugify text for URLs and index paths.
///
/// Lowercases, replaces non-alphanumeric runs with hyphens, strips
/// leading/trailing hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_hyphen = true; // suppress leading hyphen
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Expand a permalink pattern for a document.
///
/// A segment that expands to nothing (e.g. `:categories` on an
/// uncategorised post) is dropped along with its separator.
pub fn expand(pattern: &str, doc: &Document) -> String {
    let categories = doc
        .categories
        .iter()
        .map(|c| slugify(c))
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    let year = doc.date.format("%Y").to_string();
    let month = doc.date.format("%m").to_string();
    let day = doc.date.format("%d").to_string();

    let trailing_slash = pattern.ends_with('/');
    let segments: Vec<String> = pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            segment
                .replace(":categories", &categories)
                .replace(":year", &year)
                .replace(":month", &month)
                .replace(":day", &day)
                .replace(":slug", &doc.slug)
                .replace(":title", &doc.slug)
        })
        .filter(|s| !s.is_empty())
        .collect();

    let mut url = format!("/{}", segments.join("/"));
    if trailing_slash && url != "/" {
        url.push('/');
    }
    url
}

/// Map a site URL to an output path relative to the site root.
///
/// `/a/b/` and extension-less `/a/b` both become `a/b/index.html`.
/// `.` and `..` segments are discarded so a URL can never leave the root.
pub fn output_path(url: &str) -> PathBuf {
    let segments: Vec<&str> = url
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    let mut path: PathBuf = segments.iter().collect();
    let is_file = !url.ends_with('/')
        && segments
            .last()
            .map(|last| last.contains('.'))
            .unwrap_or(false);
    if !is_file {
        path.push("index.html");
    }
    path
}

/// Prefix a site-relative URL with the configured base URL.
pub fn absolute_url(base_url: &str, url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), url.trim_start_matches('/'))
}
