use super::*;
use common::{parse, record, sensitive_parse};
use sieve_core::types::config::CaseMatching;

mod common {
    use super::*;

    pub(super) fn parse(text: &str) -> Pattern {
        Pattern::parse(&text.chars().collect::<Vec<_>>(), CaseMatching::Smart)
    }

    pub(super) fn sensitive_parse(text: &str) -> Pattern {
        Pattern::parse(&text.chars().collect::<Vec<_>>(), CaseMatching::Sensitive)
    }

    pub(super) fn record(pattern: &Pattern, text: &str) -> Option<MatchRecord> {
        pattern.match_item(text, 0)
    }
}

mod parse_modes {
    use super::*;

    #[test]
    fn test_plain_query_is_fuzzy() {
        assert_eq!(parse("abc").mode, Mode::Fuzzy);
    }

    #[test]
    fn test_leading_star_forces_fuzzy() {
        let pattern = parse("*ab c");
        // The marker is stripped and the space stays a literal token.
        assert_eq!(pattern.mode, Mode::Fuzzy);
        assert!(record(&pattern, "a b c").is_some());
        assert!(record(&pattern, "abc").is_none());
    }

    #[test]
    fn test_leading_quote_is_exact_substring() {
        assert_eq!(parse("'abc").mode, Mode::Exact(Anchor::None));
    }

    #[test]
    fn test_leading_caret_anchors_start() {
        assert_eq!(parse("^abc").mode, Mode::Exact(Anchor::Start));
    }

    #[test]
    fn test_trailing_dollar_anchors_end() {
        assert_eq!(parse("abc$").mode, Mode::Exact(Anchor::End));
    }

    #[test]
    fn test_caret_and_dollar_anchor_both_ends() {
        assert_eq!(parse("^abc$").mode, Mode::Exact(Anchor::Both));
    }

    #[test]
    fn test_embedded_space_groups() {
        match parse("ab c").mode {
            Mode::Grouped(groups) => {
                assert_eq!(groups, vec![vec!['a', 'b'], vec!['c']]);
            }
            other => panic!("expected grouped mode, got {other:?}"),
        }
    }

    #[test]
    fn test_lone_marker_is_unsorted() {
        assert_eq!(parse("'").mode, Mode::Unsorted);
        assert_eq!(parse("").mode, Mode::Unsorted);
        assert_eq!(parse("   ").mode, Mode::Unsorted);
    }

    #[test]
    fn test_single_subgroup_collapses_to_fuzzy() {
        let pattern = parse(" ab ");
        assert_eq!(pattern.mode, Mode::Fuzzy);
        assert!(record(&pattern, "axb").is_some());
    }

    #[test]
    fn test_smart_case_lowercase_query_is_insensitive() {
        assert!(!parse("abc").sensitive);
    }

    #[test]
    fn test_smart_case_uppercase_query_is_sensitive() {
        assert!(parse("aBc").sensitive);
    }

    #[test]
    fn test_smart_case_checks_stripped_content() {
        // The marker itself never triggers sensitivity; the content does.
        assert!(!parse("'abc").sensitive);
        assert!(parse("'Abc").sensitive);
    }
}

mod exact {
    use super::*;

    #[test]
    fn test_substring_reports_first_occurrence() {
        let pattern = parse("'bc");
        let record = record(&pattern, "abcabc").unwrap();

        assert_eq!(record.start, 1);
        assert_eq!(record.width, 0);
        assert_eq!(record.group_count, 0);
    }

    #[test]
    fn test_substring_absent_is_excluded() {
        assert!(record(&parse("'xyz"), "abc").is_none());
    }

    #[test]
    fn test_anchored_start_requires_offset_zero() {
        let pattern = parse("^ab");
        assert!(record(&pattern, "abc").is_some());
        assert!(record(&pattern, "xabc").is_none());
    }

    #[test]
    fn test_anchored_end_requires_suffix() {
        let pattern = parse("bc$");
        let matched = record(&pattern, "xxabc").unwrap();
        assert_eq!(matched.start, 3);
        assert!(record(&pattern, "bcx").is_none());
    }

    #[test]
    fn test_anchored_both_requires_equality() {
        let pattern = parse("^abc$");
        assert!(record(&pattern, "abc").is_some());
        assert!(record(&pattern, "abcd").is_none());
        assert!(record(&pattern, "xabc").is_none());
    }

    #[test]
    fn test_sensitive_exact_respects_case() {
        let pattern = sensitive_parse("'Abc");
        assert!(record(&pattern, "xAbc").is_some());
        assert!(record(&pattern, "xabc").is_none());
    }
}

mod fuzzy {
    use super::*;

    #[test]
    fn test_ordered_subsequence_matches() {
        let matched = record(&parse("abc"), "a_b_c").unwrap();
        assert_eq!(matched.start, 0);
        assert_eq!(matched.width, 4);
        assert_eq!(matched.group_count, 3);
    }

    #[test]
    fn test_out_of_order_is_excluded() {
        assert!(record(&parse("cba"), "abc").is_none());
    }

    #[test]
    fn test_width_is_first_to_last_offset() {
        let matched = record(&parse("abc"), "axbxc").unwrap();
        assert_eq!(matched.start, 0);
        assert_eq!(matched.width, 4);
    }

    #[test]
    fn test_rescan_finds_narrower_alignment() {
        // Leftmost chain is a@0 b@1 c@9 (width 9); advancing the first
        // token finds a@5 b@7 c@9 (width 4).
        let matched = record(&parse("abc"), "abxxxaxbxc").unwrap();
        assert_eq!(matched.start, 5);
        assert_eq!(matched.width, 4);
    }

    #[test]
    fn test_width_tie_prefers_smaller_start() {
        // Both halves of "acxac" give width 1; the earlier one wins.
        let matched = record(&parse("ac"), "acxac").unwrap();
        assert_eq!(matched.start, 0);
    }

    #[test]
    fn test_group_count_counts_contiguous_runs() {
        let matched = record(&parse("abc"), "abxc").unwrap();
        assert_eq!(matched.group_count, 2);

        let contiguous = record(&parse("abc"), "xxabc").unwrap();
        assert_eq!(contiguous.group_count, 1);
    }

    #[test]
    fn test_single_token_has_zero_width() {
        let matched = record(&parse("b"), "abc").unwrap();
        assert_eq!(matched.start, 1);
        assert_eq!(matched.width, 0);
        assert_eq!(matched.group_count, 1);
    }

    #[test]
    fn test_insensitive_match_reports_folded_offsets() {
        // The session feeds the folded text under smart case; records refer
        // to the text that was searched.
        let pattern = parse("abc");
        let matched = pattern.match_item("xaxbxc", 3).unwrap();
        assert_eq!(matched.item, 3);
        assert_eq!(matched.start, 1);
    }

    #[test]
    fn test_multibyte_candidate_offsets_are_bytes() {
        let matched = record(&parse("ab"), "éab").unwrap();
        assert_eq!(matched.start, 2);
        assert_eq!(matched.width, 1);
        assert_eq!(matched.group_count, 1);
    }
}

mod grouped {
    use super::*;

    #[test]
    fn test_groups_match_in_order() {
        let pattern = parse("ab c");
        assert!(record(&pattern, "ab_x_c").is_some());
        assert!(record(&pattern, "a_b_c").is_some());
    }

    #[test]
    fn test_second_group_must_follow_first() {
        // "c" sits before "ab"; the ordered-span constraint fails.
        assert!(record(&parse("ab c"), "cab").is_none());
    }

    #[test]
    fn test_adjacent_boundary_is_not_a_break() {
        let matched = record(&parse("ab c"), "abc").unwrap();
        assert_eq!(matched.group_count, 1);
    }

    #[test]
    fn test_break_counting_across_groups() {
        // a@0 b@1 (one run), c@5: two runs total.
        let tight = record(&parse("ab c"), "ab_x_c").unwrap();
        assert_eq!(tight.group_count, 2);

        // a@0, b@2, c@4: three runs.
        let loose = record(&parse("ab c"), "a_b_c").unwrap();
        assert_eq!(loose.group_count, 3);

        assert!(tight.group_count < loose.group_count);
    }

    #[test]
    fn test_aggregate_width_spans_all_groups() {
        let matched = record(&parse("ab c"), "ab_x_c").unwrap();
        assert_eq!(matched.start, 0);
        assert_eq!(matched.width, 5);
    }
}

mod unsorted {
    use super::*;

    #[test]
    fn test_everything_matches_with_zero_keys() {
        let pattern = parse("");
        assert!(pattern.is_empty());

        let matched = pattern.match_item("anything", 9).unwrap();
        assert_eq!(matched.item, 9);
        assert_eq!(matched.group_count, 0);
        assert_eq!(matched.width, 0);
        assert_eq!(matched.start, 0);
    }
}
