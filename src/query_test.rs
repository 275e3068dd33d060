// nucscan/src/query_test.rs

#[cfg(test)]
mod tests {
    use crate::index::{NaiveMatcher, SequenceIndex};
    use crate::query::{Query, Strand, SubQuery, merge_submatches, submatch_active};

    const PATTERN: &str = "ATCGATTGCAGTCC";

    fn window(pattern: &str, start: usize, len: usize, offsets: Vec<usize>) -> SubQuery {
        SubQuery {
            span: start..start + len,
            word: pattern[start..start + len].to_string(),
            offsets,
        }
    }

    #[test]
    fn test_antisense_query_carries_reverse_complement() {
        let sense = Query::new("row1", "CGTA", Strand::Sense);
        let antisense = Query::new("row1", "CGTA", Strand::Antisense);
        assert_eq!(sense.word(), "CGTA");
        assert_eq!(antisense.word(), "TACG");
        assert_eq!(antisense.strand().symbol(), '-');
        assert_eq!(sense.name(), "row1");
    }

    #[test]
    fn test_search_both_orientations() {
        let target = b"ACGTACGT";
        let idx = SequenceIndex::build(target).unwrap();

        let mut sense = Query::new("cgta", "CGTA", Strand::Sense);
        sense.search(&idx, 0, 0);
        assert_eq!(sense.offsets(), &[1]);

        let mut antisense = Query::new("cgta", "CGTA", Strand::Antisense);
        antisense.search(&idx, 0, 0);
        assert_eq!(antisense.offsets(), &[3]);

        let naive = NaiveMatcher::new(target);
        let mut again = Query::new("cgta", "CGTA", Strand::Sense);
        again.search(&naive, 0, 0);
        assert_eq!(again.offsets(), sense.offsets());
    }

    #[test]
    fn test_partial_hit_becomes_one_merged_submatch() {
        // Target holds the first 12 bases of the pattern only
        let target = b"GGGGGGATCGATTGCAGTGGGGGG";
        let idx = SequenceIndex::build(target).unwrap();

        let mut query = Query::new("p", PATTERN, Strand::Sense);
        query.search(&idx, 0, 10);

        assert_eq!(query.count(), 0);
        assert_eq!(query.submatches().len(), 1);
        let sub = &query.submatches()[0];
        assert_eq!(sub.span, 0..12);
        assert_eq!(sub.word, "ATCGATTGCAGT");
        assert_eq!(sub.offsets, vec![6]);
        assert_eq!(query.total_count(), 1);
    }

    #[test]
    fn test_two_separate_partial_hits() {
        // P[0..11) at offset 4 and P[3..14) at offset 24
        let target = b"GGGGATCGATTGCAGGGGGGGGGGGATTGCAGTCCGGGG";
        let naive = NaiveMatcher::new(target);

        let mut query = Query::new("p", PATTERN, Strand::Sense);
        query.search(&naive, 0, 10);

        let spans: Vec<_> = query.submatches().iter().map(|s| (s.span.clone(), s.offsets.clone())).collect();
        assert_eq!(spans, vec![(3..14, vec![24]), (0..11, vec![4])]);
        assert_eq!(query.total_count(), 2);
    }

    #[test]
    fn test_full_match_drops_the_chain() {
        let target = b"GGGATCGATTGCAGTCCGGG";
        let idx = SequenceIndex::build(target).unwrap();

        let mut query = Query::new("p", PATTERN, Strand::Sense);
        query.search(&idx, 0, 10);

        assert_eq!(query.offsets(), &[3]);
        assert!(query.submatches().is_empty());
        assert_eq!(query.total_count(), 1);
    }

    #[test]
    fn test_merge_consumes_offsets_and_prunes() {
        let pattern = &PATTERN[..12];
        let subs = vec![
            window(pattern, 0, 10, vec![5, 40]),
            window(pattern, 1, 10, vec![6]),
            window(pattern, 2, 10, vec![7, 90]),
        ];
        let merged = merge_submatches(pattern, subs);

        // The run at diagonal 5 spans the whole pattern and is dropped
        assert_eq!(
            merged,
            vec![window(pattern, 2, 10, vec![90]), window(pattern, 0, 10, vec![40])]
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let subs = vec![
            window(PATTERN, 0, 10, vec![3, 50]),
            window(PATTERN, 1, 10, vec![4, 51, 80]),
            window(PATTERN, 2, 10, vec![52]),
            window(PATTERN, 3, 10, vec![]),
            window(PATTERN, 4, 10, vec![83, 120]),
        ];
        let once = merge_submatches(PATTERN, subs);
        let twice = merge_submatches(PATTERN, once.clone());
        assert_eq!(once, twice);
        assert!(once.iter().all(|s| s.count() > 0));
        // 3..4 -> [0,11); 50..52 -> [0,12); 80, 83, 120 stay single windows
        let total: usize = once.iter().map(SubQuery::count).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_submatch_activation() {
        assert!(!submatch_active(0));
        assert!(!submatch_active(9));
        assert!(submatch_active(10));

        // Pattern shorter than the window: no sub-queries
        let idx = SequenceIndex::build(b"ATCGATTGCA").unwrap();
        let mut query = Query::new("short", "ATCGATTGC", Strand::Sense);
        query.search(&idx, 0, 10);
        assert_eq!(query.count(), 1);
        assert!(query.submatches().is_empty());
    }
}
