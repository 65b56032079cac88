//! Property tests for dependency parsing.

use proptest::prelude::*;
use simform_model::Dependency;

const NAME: &str = "[A-Za-z_][A-Za-z0-9_]{0,12}";

proptest! {
    #[test]
    fn two_segments_parse(model in NAME, field in NAME) {
        let input = format!("{model}.{field}");
        let dep = Dependency::parse(&input).unwrap();
        prop_assert_eq!(dep.model_name, model);
        prop_assert_eq!(dep.field_name, field);
    }

    #[test]
    fn wildcard_field_parses(model in NAME) {
        let input = format!("{model}.*");
        let dep = Dependency::parse(&input).unwrap();
        prop_assert!(dep.is_wildcard());
    }

    #[test]
    fn single_segment_fails(input in "[A-Za-z0-9_*]{0,20}") {
        prop_assert!(Dependency::parse(&input).is_err());
    }

    #[test]
    fn three_segments_fail(a in NAME, b in NAME, c in NAME) {
        let input = format!("{a}.{b}.{c}");
        prop_assert!(Dependency::parse(&input).is_err());
    }
}
