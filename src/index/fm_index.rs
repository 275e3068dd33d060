// FM-Index operations over a SequenceIndex
//
// This module contains the backward-search side of the index:
// - Occurrence counting from block checkpoints plus a partial block scan
// - Single-symbol backward extension of a suffix-array interval
// - Exact backward search
// - Branch-and-bound backward search tolerating substitutions

use super::bwt::SequenceIndex;
use crate::alphabet::{SIGMA, base_to_rank};

/// Half-open suffix-array interval [low, high).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaInterval {
    pub low: usize,
    pub high: usize,
}

impl SaInterval {
    /// Interval covering every suffix, terminator included.
    pub fn full(idx: &SequenceIndex) -> Self {
        SaInterval {
            low: 0,
            high: idx.seq_len,
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.low >= self.high
    }

    pub fn size(&self) -> usize {
        self.high.saturating_sub(self.low)
    }
}

/// One surviving branch of the mismatch search.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    mismatches: usize,
    interval: SaInterval,
}

/// Occurrences of rank `c` in `bwt_data[0..k]`.
#[inline(always)]
pub fn get_occ(idx: &SequenceIndex, k: usize, c: u8) -> usize {
    let block = k / idx.block_size;
    let start = block * idx.block_size;
    let partial = idx.bwt_data[start..k].iter().filter(|&&b| b == c).count();
    idx.occ[block][c as usize] as usize + partial
}

/// Narrow `interval` to the suffixes preceded by rank `c`.
#[inline(always)]
pub fn backward_ext(idx: &SequenceIndex, interval: SaInterval, c: u8) -> SaInterval {
    let base = idx.cumulative_count[c as usize];
    SaInterval {
        low: base + get_occ(idx, interval.low, c),
        high: base + get_occ(idx, interval.high, c),
    }
}

/// Suffix-array interval of the suffixes starting with `pattern`, or `None`
/// when the pattern does not occur.
pub fn exact_interval(idx: &SequenceIndex, pattern: &[u8]) -> Option<SaInterval> {
    if pattern.is_empty() {
        return None;
    }

    let mut interval = SaInterval::full(idx);
    for &b in pattern.iter().rev() {
        let c = base_to_rank(b)?;
        interval = backward_ext(idx, interval, c);
        if interval.is_empty() {
            return None;
        }
    }
    Some(interval)
}

/// Sorted 0-based offsets of the exact occurrences of `pattern`.
pub fn search_exact(idx: &SequenceIndex, pattern: &[u8]) -> Vec<usize> {
    match exact_interval(idx, pattern) {
        Some(interval) => {
            let mut offsets = locate(idx, interval);
            offsets.sort_unstable();
            offsets
        }
        None => Vec::new(),
    }
}

/// Sorted 0-based offsets of the occurrences of `pattern` with at most
/// `max_mismatches` substitutions.
///
/// Every candidate on the worklist stands for a distinct concrete string of
/// the same length as the consumed pattern suffix, so the final intervals
/// are disjoint and no offset is reported twice.
pub fn search_mismatches(idx: &SequenceIndex, pattern: &[u8], max_mismatches: usize) -> Vec<usize> {
    if pattern.is_empty() {
        return Vec::new();
    }

    let mut candidates = vec![Candidate {
        mismatches: 0,
        interval: SaInterval::full(idx),
    }];
    let mut next: Vec<Candidate> = Vec::new();

    for &b in pattern.iter().rev() {
        let expected = base_to_rank(b);
        next.clear();

        for cand in &candidates {
            for c in 1..SIGMA as u8 {
                let interval = backward_ext(idx, cand.interval, c);
                if interval.is_empty() {
                    continue;
                }
                if Some(c) == expected {
                    next.push(Candidate {
                        mismatches: cand.mismatches,
                        interval,
                    });
                } else if cand.mismatches < max_mismatches {
                    next.push(Candidate {
                        mismatches: cand.mismatches + 1,
                        interval,
                    });
                }
            }
        }

        if next.is_empty() {
            return Vec::new();
        }
        std::mem::swap(&mut candidates, &mut next);
    }

    let mut offsets: Vec<usize> = candidates
        .iter()
        .flat_map(|cand| locate(idx, cand.interval))
        .collect();
    offsets.sort_unstable();
    debug_assert!(
        offsets.windows(2).all(|w| w[0] < w[1]),
        "candidate intervals must be disjoint"
    );
    offsets
}

/// Text offsets of every suffix in `interval`.
#[inline]
pub fn locate(idx: &SequenceIndex, interval: SaInterval) -> Vec<usize> {
    idx.suffix_array[interval.low..interval.high].to_vec()
}
