//! Category and tag indexes
//!
//! Derived purely from the document list. Groups are keyed by the
//! slugified name so `Clojure` and `clojure` share one index page.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::Document;
use crate::permalink::slugify;

/// Documents sharing one category or tag
#[derive(Debug, Clone, PartialEq)]
pub struct IndexGroup<'a> {
    /// Name as first written in front matter
    pub name: String,
    pub slug: String,
    pub documents: Vec<&'a Document>,
}

/// All indexes of a site
#[derive(Debug, Clone, Default)]
pub struct SiteIndex<'a> {
    /// Every document, newest first
    pub all: Vec<&'a Document>,
    pub categories: BTreeMap<String, IndexGroup<'a>>,
    pub tags: BTreeMap<String, IndexGroup<'a>>,
}

/// Date descending, then id ascending.
pub fn listing_order(a: &Document, b: &Document) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id))
}

impl<'a> SiteIndex<'a> {
    pub fn build(documents: &'a [Document]) -> Self {
        let mut all: Vec<&Document> = documents.iter().collect();
        all.sort_by(|a, b| listing_order(a, b));

        let mut categories = BTreeMap::new();
        let mut tags = BTreeMap::new();
        for doc in &all {
            for name in &doc.categories {
                insert(&mut categories, name, doc);
            }
            for name in &doc.tags {
                insert(&mut tags, name, doc);
            }
        }

        tracing::debug!(
            documents = all.len(),
            categories = categories.len(),
            tags = tags.len(),
            "built site index"
        );

        Self {
            all,
            categories,
            tags,
        }
    }

    pub fn category(&self, name: &str) -> Option<&IndexGroup<'a>> {
        self.categories.get(&slugify(name))
    }

    pub fn tag(&self, name: &str) -> Option<&IndexGroup<'a>> {
        self.tags.get(&slugify(name))
    }
}

fn insert<'a>(groups: &mut BTreeMap<String, IndexGroup<'a>>, name: &str, doc: &'a Document) {
    let slug = slugify(name);
    if slug.is_empty() {
        return;
    }
    let group = groups.entry(slug.clone()).or_insert_with(|| IndexGroup {
        name: name.to_string(),
        slug,
        documents: Vec::new(),
    });
    // `all` is already ordered, so appending keeps the group ordered too
    if !group.documents.iter().any(|d| d.id == doc.id) {
        group.documents.push(doc);
    }
}
