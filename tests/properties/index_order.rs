//! Property tests for category indexes.

use chrono::NaiveDate;
use proptest::prelude::*;

use folio::permalink::slugify;
use folio::{Document, SiteIndex};

const CATEGORIES: &[&str] = &["clojure", "rust", "testing"];

fn document() -> impl Strategy<Value = (u32, u32, Vec<usize>)> {
    (
        1u32..=28,
        0u32..24,
        proptest::collection::vec(0..CATEGORIES.len(), 0..=3),
    )
}

fn build(specs: &[(u32, u32, Vec<usize>)]) -> Vec<Document> {
    specs
        .iter()
        .enumerate()
        .map(|(i, (day, hour, cats))| {
            let date = NaiveDate::from_ymd_opt(2015, 2, *day)
                .unwrap()
                .and_hms_opt(*hour, 0, 0)
                .unwrap();
            let categories: Vec<&str> = cats.iter().map(|c| CATEGORIES[*c]).collect();
            Document::new(format!("2015-02-{:02}-post-{}", day, i), "T", "post", date, "")
                .with_categories(categories)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a category index holds exactly the documents carrying the
    /// category, newest first with ties broken by ascending id.
    #[test]
    fn property_category_index_is_exact_and_ordered(
        specs in proptest::collection::vec(document(), 0..20),
    ) {
        let docs = build(&specs);
        let index = SiteIndex::build(&docs);

        for category in CATEGORIES {
            let mut expected: Vec<&Document> = docs
                .iter()
                .filter(|d| d.categories.iter().any(|c| c == category))
                .collect();
            expected.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
            let expected: Vec<&str> = expected.iter().map(|d| d.id.as_str()).collect();

            let actual: Vec<&str> = index
                .category(category)
                .map(|g| g.documents.iter().map(|d| d.id.as_str()).collect())
                .unwrap_or_default();

            prop_assert_eq!(actual, expected);
        }

        prop_assert!(index.categories.keys().all(|k| k == &slugify(k)));
        prop_assert_eq!(index.all.len(), docs.len());
    }
}
