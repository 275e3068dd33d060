// nucscan/src/index/bwt_test.rs

#[cfg(test)]
mod tests {
    use crate::alphabet::rank_to_base;
    use crate::index::bwt::SequenceIndex;
    use crate::index::fm_index::{exact_interval, get_occ, search_exact, search_mismatches};
    use crate::index::naive;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_sequence(rng: &mut StdRng, len: usize, alphabet: &[u8]) -> Vec<u8> {
        (0..len)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect()
    }

    #[test]
    fn test_build_small_sequence() {
        // ACGTACGT$ sorted suffixes:
        //   $ ACGT$ ACGTACGT$ CGT$ CGTACGT$ GT$ GTACGT$ T$ TACGT$
        let idx = SequenceIndex::build(b"ACGTACGT").unwrap();

        assert_eq!(idx.seq_len, 9);
        assert_eq!(idx.suffix_array, vec![8, 4, 0, 5, 1, 6, 2, 7, 3]);
        assert_eq!(idx.primary, 2);

        let bwt: Vec<u8> = idx.bwt_data.iter().map(|&r| rank_to_base(r)).collect();
        assert_eq!(bwt, b"TT$AACCGG".to_vec());

        // $=1, A=2, C=2, G=2, N=0, T=2
        assert_eq!(idx.cumulative_count, [0, 1, 3, 5, 7, 7]);
    }

    #[test]
    fn test_terminator_sits_on_primary_row() {
        let idx = SequenceIndex::build(b"GATTACA").unwrap();
        assert_eq!(idx.suffix_array[idx.primary], 0);
        assert_eq!(idx.bwt_data[idx.primary], 0);
        assert_eq!(idx.bwt_data.iter().filter(|&&r| r == 0).count(), 1);
        // Row 0 is the terminator suffix, preceded by the last base
        assert_eq!(idx.suffix_array[0], 7);
        assert_eq!(rank_to_base(idx.bwt_data[0]), b'A');
    }

    #[test]
    fn test_occurrence_blocks_match_direct_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let seq = random_sequence(&mut rng, 257, b"ACGNT");
        for block_size in [1usize, 5, 18, 64, 1000] {
            let idx = SequenceIndex::build_with_block_size(&seq, block_size).unwrap();
            for k in 0..=idx.seq_len {
                for c in 0..6u8 {
                    let direct = idx.bwt_data[..k].iter().filter(|&&b| b == c).count();
                    assert_eq!(get_occ(&idx, k, c), direct, "k={k} c={c} block={block_size}");
                }
            }
        }
    }

    #[test]
    fn test_invert_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);
        for len in [1usize, 2, 17, 18, 19, 36, 100, 1000] {
            let seq = random_sequence(&mut rng, len, b"ACGNT");
            let idx = SequenceIndex::build(&seq).unwrap();
            assert_eq!(idx.invert(), seq, "round trip failed for length {len}");
        }
        let idx = SequenceIndex::build(b"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").unwrap();
        assert_eq!(idx.invert(), b"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_vec());
    }

    #[test]
    fn test_build_rejects_unknown_bases() {
        assert!(SequenceIndex::build(b"ACGU").is_err());
        assert!(SequenceIndex::build(b"acgt").is_err());
    }

    #[test]
    fn test_exact_search_small() {
        let idx = SequenceIndex::build(b"ACGTACGT").unwrap();
        assert_eq!(search_exact(&idx, b"CGTA"), vec![1]);
        assert_eq!(search_exact(&idx, b"ACGT"), vec![0, 4]);
        assert_eq!(search_exact(&idx, b"TACG"), vec![3]);
        assert_eq!(search_exact(&idx, b"T"), vec![3, 7]);
        assert!(search_exact(&idx, b"GG").is_empty());
        assert!(search_exact(&idx, b"ACGTACGTA").is_empty());
        assert!(search_exact(&idx, b"").is_empty());
        assert_eq!(exact_interval(&idx, b"ACGT").map(|i| i.size()), Some(2));
    }

    #[test]
    fn test_mismatch_search_small() {
        let idx = SequenceIndex::build(b"ACGTACGT").unwrap();
        // One substitution at the last symbol, at both ACGT copies
        assert_eq!(search_mismatches(&idx, b"ACGA", 1), vec![0, 4]);
        assert!(search_mismatches(&idx, b"ACGA", 0).is_empty());
        // Four substitutions allow every window of length 4
        assert_eq!(search_mismatches(&idx, b"TTTT", 4), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_indexed_matches_naive() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..20 {
            let len = rng.gen_range(20..400);
            let seq = random_sequence(&mut rng, len, b"ACGT");
            let idx = SequenceIndex::build(&seq).unwrap();
            for _ in 0..30 {
                let plen = rng.gen_range(1..12);
                let pattern = if rng.gen_bool(0.5) && plen < len {
                    let start = rng.gen_range(0..len - plen);
                    seq[start..start + plen].to_vec()
                } else {
                    random_sequence(&mut rng, plen, b"ACGT")
                };
                assert_eq!(
                    search_exact(&idx, &pattern),
                    naive::search_exact(&seq, &pattern),
                    "exact mismatch for {:?}",
                    String::from_utf8_lossy(&pattern)
                );
                for k in 1..=2 {
                    assert_eq!(
                        search_mismatches(&idx, &pattern, k),
                        naive::search_mismatches(&seq, &pattern, k),
                        "k={} mismatch for {:?}",
                        k,
                        String::from_utf8_lossy(&pattern)
                    );
                }
            }
        }
    }

    #[test]
    fn test_mismatch_budget_is_monotone() {
        let mut rng = StdRng::seed_from_u64(99);
        let seq = random_sequence(&mut rng, 600, b"ACGNT");
        let idx = SequenceIndex::build(&seq).unwrap();
        for _ in 0..25 {
            let pattern = random_sequence(&mut rng, 8, b"ACGT");
            let mut previous = search_exact(&idx, &pattern);
            for k in 1..=3 {
                let current = search_mismatches(&idx, &pattern, k);
                assert!(
                    previous.iter().all(|p| current.contains(p)),
                    "budget {k} lost offsets of budget {}",
                    k - 1
                );
                previous = current;
            }
        }
    }
}
