//! Property tests for front matter extraction and document parsing.

use std::path::Path;

use proptest::prelude::*;

use folio::parse_document;
use folio::parser::extract_frontmatter;

fn small_line() -> impl Strategy<Value = String> {
    // Printable and short; never exactly the delimiter
    proptest::string::string_regex("[A-Za-z0-9 _:#\\-\\[\\]{}%]{0,40}")
        .unwrap()
        .prop_filter("not a delimiter", |s| s.trim() != "---")
}

/// `str::lines` cannot round-trip a trailing empty line, so bodies end with text.
fn body(max: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(small_line(), 0..=max)
        .prop_filter("ends with text", |v| v.last().map_or(true, |l| !l.is_empty()))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: well-formed front matter is split exactly at the delimiters.
    #[test]
    fn property_extract_frontmatter_splits_at_delimiters(
        yaml_lines in proptest::collection::vec(small_line(), 0..=8),
        body_lines in body(12),
    ) {
        let mut content_lines = vec!["---".to_string()];
        content_lines.extend(yaml_lines.clone());
        content_lines.push("---".to_string());
        content_lines.extend(body_lines.clone());
        let content = content_lines.join("\n");

        let extracted = extract_frontmatter(&content, Path::new("test.md")).unwrap();

        prop_assert_eq!(extracted.yaml, yaml_lines.join("\n"));
        prop_assert_eq!(extracted.body, body_lines.join("\n"));
        prop_assert_eq!(extracted.end_line, 2 + yaml_lines.len());
    }

    /// PROPERTY: parsing arbitrary text never panics.
    #[test]
    fn property_parse_document_never_panics(content in ".{0,400}") {
        let _ = parse_document(&content, Path::new("2015-02-28-x.md"));
    }

    /// PROPERTY: a document with title and layout always parses, and keeps
    /// its body verbatim.
    #[test]
    fn property_minimal_document_parses(
        title in "[A-Za-z][A-Za-z0-9 ]{0,30}",
        body_lines in body(6),
    ) {
        let body = body_lines.join("\n");
        let content = format!("---\nlayout: post\ntitle: \"{}\"\n---\n{}", title, body);

        let doc = parse_document(&content, Path::new("2015-02-28-x.md")).unwrap();
        prop_assert_eq!(doc.title, title);
        prop_assert_eq!(doc.body, body);
        prop_assert_eq!(doc.slug, "x");
    }
}
