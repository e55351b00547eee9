//! Renderer - turns documents and index listings into HTML pages
//!
//! Rendering is a pure function of its inputs: the same document, layouts
//! and site config always produce byte-identical output.

mod layouts;
pub mod markup;

pub use layouts::{LayoutSet, LISTING_TEMPLATE, SHELL_TEMPLATE};
pub use markup::{render_body, render_markdown, render_markup};

use std::collections::BTreeMap;

use serde::Serialize;
use tera::Context;

use crate::config::SiteConfig;
use crate::error::FolioResult;
use crate::models::Document;
use crate::permalink::{absolute_url, expand};

/// `page` as seen by layouts
#[derive(Debug, Clone, Serialize)]
pub struct PageContext<'a> {
    pub id: &'a str,
    pub title: &'a str,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `YYYY-MM-DDTHH:MM:SS`
    pub date_iso: String,
    /// `Feb 28, 2015`
    pub date_display: String,
    /// Site-relative URL
    pub url: &'a str,
    pub categories: &'a [String],
    pub tags: &'a [String],
    pub extra: &'a BTreeMap<String, serde_yaml_ng::Value>,
}

/// A rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub id: String,
    pub url: String,
    pub html: String,
}

/// One row of an index listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub id: String,
    pub title: String,
    pub date: String,
    pub date_iso: String,
    /// Link target including the site base URL
    pub href: String,
}

/// An index page before rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    /// Identifier used in errors and build events (`category:clojure`)
    pub id: String,
    pub title: String,
    pub url: String,
    pub entries: Vec<ListingEntry>,
}

/// Renders documents and listings with a fixed layout set and site config
#[derive(Debug)]
pub struct Renderer {
    layouts: LayoutSet,
    site: SiteConfig,
    permalink: String,
}

impl Renderer {
    pub fn new(layouts: LayoutSet, site: SiteConfig, permalink: impl Into<String>) -> Self {
        Self {
            layouts,
            site,
            permalink: permalink.into(),
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Site-relative URL of a document (front matter permalink wins).
    pub fn url_for(&self, doc: &Document) -> String {
        expand(doc.permalink.as_deref().unwrap_or(&self.permalink), doc)
    }

    /// Listing row for a document
    pub fn entry_for(&self, doc: &Document) -> ListingEntry {
        ListingEntry {
            id: doc.id.clone(),
            title: doc.title.clone(),
            date: doc.date.format("%Y-%m-%d").to_string(),
            date_iso: doc.date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            href: absolute_url(&self.site.base_url, &self.url_for(doc)),
        }
    }

    /// Render a document through its layout chain.
    ///
    /// The layout is resolved before the body is parsed so a missing layout
    /// is reported even when the body is also broken.
    pub fn render(&self, doc: &Document) -> FolioResult<RenderedPage> {
        self.layouts.chain(&doc.layout, &doc.id)?;

        let body = render_body(doc)?;
        let url = self.url_for(doc);

        let page = PageContext {
            id: &doc.id,
            title: &doc.title,
            date: doc.date.format("%Y-%m-%d").to_string(),
            date_iso: doc.date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            date_display: doc.date.format("%b %-d, %Y").to_string(),
            url: &url,
            categories: &doc.categories,
            tags: &doc.tags,
            extra: &doc.extra,
        };

        let mut context = Context::new();
        context.insert("page", &page);
        context.insert("site", &self.site);

        let html = self.layouts.apply(&doc.layout, body, &context, &doc.id)?;
        tracing::debug!(id = %doc.id, layout = %doc.layout, url = %url, "rendered document");

        Ok(RenderedPage {
            id: doc.id.clone(),
            url,
            html,
        })
    }

    /// Render an index listing, wrapped in `layout` or the built-in shell.
    ///
    /// `page` has the same fields as for documents; the date fields are
    /// empty strings.
    pub fn render_listing(&self, listing: &Listing, layout: Option<&str>) -> FolioResult<String> {
        let extra = BTreeMap::new();
        let page = PageContext {
            id: &listing.id,
            title: &listing.title,
            date: String::new(),
            date_iso: String::new(),
            date_display: String::new(),
            url: &listing.url,
            categories: &[],
            tags: &[],
            extra: &extra,
        };

        let mut context = Context::new();
        context.insert("listing", listing);
        context.insert("page", &page);
        context.insert("site", &self.site);

        let content = self
            .layouts
            .render_template(LISTING_TEMPLATE, &context, &listing.id)?;

        match layout {
            Some(name) => self.layouts.apply(name, content, &context, &listing.id),
            None => {
                context.insert("content", &content);
                self.layouts
                    .render_template(SHELL_TEMPLATE, &context, &listing.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, FolioError};
    use chrono::NaiveDate;

    fn date() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 2, 28)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn renderer() -> Renderer {
        let mut layouts = LayoutSet::new();
        layouts
            .add(
                "post",
                "<h1>{{ page.title }}</h1><time>{{ page.date_display }}</time>{{ content }}",
            )
            .unwrap();
        layouts
            .add("meta", "{{ page.url }}|{{ page.categories | join(sep=\",\") }}|{{ page.extra.mood }}")
            .unwrap();
        Renderer::new(layouts, SiteConfig::default(), crate::config::DEFAULT_PERMALINK)
    }

    #[test]
    fn render_wraps_body_in_layout() {
        let doc = Document::new("2015-02-28-a", "Hello", "post", date(), "*hi*");
        let page = renderer().render(&doc).unwrap();

        insta::assert_snapshot!(
            page.html.trim_end(),
            @"<h1>Hello</h1><time>Feb 28, 2015</time><p><em>hi</em></p>"
        );
        assert_eq!(page.url, "/2015/02/28/a.html");
    }

    #[test]
    fn render_exposes_page_fields() {
        let mut doc = Document::new("2015-02-28-a", "Hello", "meta", date(), "")
            .with_categories(["clojure", "testing"]);
        doc.extra
            .insert("mood".into(), serde_yaml_ng::Value::String("grumpy".into()));

        let page = renderer().render(&doc).unwrap();
        assert_eq!(
            page.html,
            "/clojure/testing/2015/02/28/a.html|clojure,testing|grumpy"
        );
    }

    #[test]
    fn render_twice_is_identical() {
        let doc = Document::new("2015-02-28-a", "Hello", "post", date(), "# x\n\ntext");
        let r = renderer();
        assert_eq!(r.render(&doc).unwrap(), r.render(&doc).unwrap());
    }

    #[test]
    fn undefined_layout_is_reported_before_markup() {
        let doc = Document::new("2015-02-28-a", "Hello", "missing", date(), "{% endraw %}");
        let err = renderer().render(&doc).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Template);
        assert!(matches!(err, FolioError::UndefinedLayout { ref layout, .. } if layout == "missing"));
    }

    #[test]
    fn markup_error_names_document() {
        let doc = Document::new("2015-02-28-a", "Hello", "post", date(), "{% highlight x %}");
        let err = renderer().render(&doc).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Markup);
        assert!(err.to_string().contains("2015-02-28-a"));
    }

    #[test]
    fn front_matter_permalink_overrides_site_pattern() {
        let mut doc = Document::new("2015-02-28-a", "Hello", "post", date(), "");
        doc.permalink = Some("/notes/:slug/".into());
        assert_eq!(renderer().url_for(&doc), "/notes/a/");
    }

    #[test]
    fn listing_uses_builtin_shell_without_layout() {
        let r = renderer();
        let doc = Document::new("2015-02-28-a", "A <b>", "post", date(), "");
        let listing = Listing {
            id: "category:clojure".into(),
            title: "clojure".into(),
            url: "/categories/clojure/".into(),
            entries: vec![r.entry_for(&doc)],
        };

        let html = r.render_listing(&listing, None).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<a href=\"/2015/02/28/a.html\">A &lt;b&gt;</a>"), "{html}");
        assert!(html.contains("<time datetime=\"2015-02-28T00:00:00\">2015-02-28</time>"));
    }

    #[test]
    fn listing_can_share_a_document_layout() {
        let listing = Listing {
            id: "home".into(),
            title: "Home".into(),
            url: "/".into(),
            entries: vec![],
        };
        let html = renderer().render_listing(&listing, Some("post")).unwrap();
        assert!(html.starts_with("<h1>Home</h1><time></time>"), "{html}");
    }

    #[test]
    fn listing_with_undefined_layout_fails() {
        let listing = Listing {
            id: "home".into(),
            title: "Home".into(),
            url: "/".into(),
            entries: vec![],
        };
        let err = renderer().render_listing(&listing, Some("index")).unwrap_err();
        assert!(matches!(err, FolioError::UndefinedLayout { ref layout, ref document } if layout == "index" && document == "home"));
    }
}
