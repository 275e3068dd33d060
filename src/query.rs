// Queries and their sub-window ("submatch") chains
//
// A Query is one orientation of one reference word. When submatch search is
// active, every window of the configured length is searched on its own and
// the hits are merged back along the diagonals they share, so that a stretch
// of contiguous window hits is reported once, as one longer sub-query.

use crate::alphabet::reverse_complement;
use crate::defaults::SUBMATCH_ACTIVATION;
use crate::index::Matcher;
use std::collections::BTreeMap;
use std::ops::Range;

#[path = "query_test.rs"]
mod query_test;

/// Orientation of a query relative to the reference word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    /// The reference word as written
    Sense,
    /// The reverse complement of the reference word
    Antisense,
}

impl Strand {
    /// GFF3 strand column.
    pub fn symbol(self) -> char {
        match self {
            Strand::Sense => '+',
            Strand::Antisense => '-',
        }
    }
}

/// A part of the query pattern found on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubQuery {
    /// Half-open range of the pattern this sub-query covers
    pub span: Range<usize>,
    /// The covered part of the pattern
    pub word: String,
    /// Sorted 0-based target offsets
    pub offsets: Vec<usize>,
}

impl SubQuery {
    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

/// Pattern, orientation, match offsets and the sub-query chain.
#[derive(Debug, Clone)]
pub struct Query {
    name: String,
    word: String,
    strand: Strand,
    offsets: Vec<usize>,
    submatches: Vec<SubQuery>,
}

impl Query {
    /// Build the query for `row_word` in the given orientation; antisense
    /// queries carry the reverse complement.
    pub fn new(name: &str, row_word: &str, strand: Strand) -> Self {
        let word = match strand {
            Strand::Sense => row_word.to_string(),
            Strand::Antisense => reverse_complement(row_word),
        };
        Query {
            name: name.to_string(),
            word,
            strand,
            offsets: Vec::new(),
            submatches: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn submatches(&self) -> &[SubQuery] {
        &self.submatches
    }

    /// Hits of the full-length pattern.
    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    /// Hits of the full-length pattern plus every surviving sub-query.
    pub fn total_count(&self) -> usize {
        self.count() + self.submatches.iter().map(SubQuery::count).sum::<usize>()
    }

    /// Search the pattern, then its sub-windows when `min_submatch` enables
    /// them.
    pub fn search(&mut self, matcher: &dyn Matcher, mismatches: usize, min_submatch: usize) {
        self.offsets = matcher.find(self.word.as_bytes(), mismatches);
        self.submatches.clear();

        if submatch_active(min_submatch) && self.word.len() >= min_submatch {
            self.search_windows(matcher, mismatches, min_submatch);
        }
    }

    fn search_windows(&mut self, matcher: &dyn Matcher, mismatches: usize, window: usize) {
        let bytes = self.word.as_bytes();
        let mut subs = Vec::with_capacity(bytes.len() - window + 1);
        for start in 0..=bytes.len() - window {
            let span = start..start + window;
            let offsets = matcher.find(&bytes[span.clone()], mismatches);
            subs.push(SubQuery {
                word: self.word[span.clone()].to_string(),
                span,
                offsets,
            });
        }
        self.submatches = merge_submatches(&self.word, subs);
    }
}

/// Whether a configured minimum window length turns submatch search on.
pub fn submatch_active(min_submatch: usize) -> bool {
    min_submatch >= SUBMATCH_ACTIVATION
}

/// Merge window hits that continue each other on the same diagonal.
///
/// A hit of span [a, b) at offset p continues a hit of span [a-1, b-1) at
/// offset p-1: the left one minus its last symbol and the right one minus its
/// first symbol cover the same bases. Each maximal run of such hits becomes
/// one hit of the union span at the run's first offset, and the hits it
/// consumed disappear from the shorter records. Records left without hits are
/// pruned, as is any record spanning the whole pattern (those hits are the
/// full-length matches themselves).
///
/// Merging an already merged chain changes nothing: two runs on one diagonal
/// are never adjacent, or they would have been a single run.
pub fn merge_submatches(pattern: &str, subs: Vec<SubQuery>) -> Vec<SubQuery> {
    // (diagonal, span start, span end, target offset), diagonal = offset - start
    let mut hits: Vec<(isize, usize, usize, usize)> = subs
        .iter()
        .flat_map(|sub| {
            sub.offsets.iter().map(move |&p| {
                (p as isize - sub.span.start as isize, sub.span.start, sub.span.end, p)
            })
        })
        .collect();
    hits.sort_unstable();
    hits.dedup();

    let mut merged: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    let mut i = 0;
    while i < hits.len() {
        let (diag, start, mut end, offset) = hits[i];
        let mut last_start = start;
        let mut j = i + 1;
        while j < hits.len() {
            let (d, s, e, _) = hits[j];
            if d != diag || s != last_start + 1 || e != end + 1 {
                break;
            }
            last_start = s;
            end = e;
            j += 1;
        }
        merged.entry((start, end)).or_default().push(offset);
        i = j;
    }

    let full = 0..pattern.len();
    let mut result: Vec<SubQuery> = merged
        .into_iter()
        .filter(|((start, end), offsets)| !offsets.is_empty() && (*start..*end) != full)
        .map(|((start, end), mut offsets)| {
            offsets.sort_unstable();
            SubQuery {
                word: pattern[start..end].to_string(),
                span: start..end,
                offsets,
            }
        })
        .collect();

    // Windows first (rightmost first), longer merged records after
    result.sort_by(|a, b| a.len().cmp(&b.len()).then(b.span.start.cmp(&a.span.start)));
    result
}
