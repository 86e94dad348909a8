//! Property-based tests for presentation labels

use chrono::{Duration, Utc};
use pixfeed::client::view::{age_label, like_label, view_all_label};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_like_label_matches_count(count in 0usize..10_000) {
        match like_label(count) {
            None => prop_assert_eq!(count, 0),
            Some(label) => {
                prop_assert!(label.starts_with(&count.to_string()));
                prop_assert_eq!(label.ends_with("likes"), count != 1);
            }
        }
    }

    #[test]
    fn test_view_all_only_past_preview(count in 0u64..1_000) {
        prop_assert_eq!(view_all_label(count).is_some(), count > 2);
    }

    #[test]
    fn test_age_label_has_one_unit(seconds in -3_600i64..10_000_000) {
        let created = Utc::now();
        let label = age_label(created, created + Duration::seconds(seconds));
        prop_assert!(label.ends_with(" ago"));
        let unit = label.trim_end_matches(" ago").chars().last();
        prop_assert!(matches!(unit, Some('m') | Some('h') | Some('d')));
    }
}
