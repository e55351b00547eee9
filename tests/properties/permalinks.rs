//! Property tests for permalink and output path handling.

use std::path::Component;

use proptest::prelude::*;

use folio::permalink::{output_path, slugify};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: no URL maps to a path outside the output root.
    #[test]
    fn property_output_path_stays_relative(url in "[a-z./]{0,40}") {
        let path = output_path(&url);
        prop_assert!(path.components().all(|c| matches!(c, Component::Normal(_))));
    }

    /// PROPERTY: slugs never start or end with a hyphen or contain a double hyphen.
    #[test]
    fn property_slugify_shape(text in "[A-Za-z0-9éÜ _.,!?/-]{0,60}") {
        let slug = slugify(&text);
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
        prop_assert_eq!(slugify(&slug), slug.clone());
    }
}
