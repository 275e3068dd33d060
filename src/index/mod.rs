// Per-sequence full-text index and the two search strategies.
//
// A SequenceIndex is built over one target sequence for the duration of a
// scan pass. The naive matcher scans the plain residues instead; both answer
// the same question through the Matcher trait.

pub mod bwt;
pub mod fm_index;
pub mod naive;

pub use bwt::SequenceIndex;
pub use naive::NaiveMatcher;

/// Anything that can report the 0-based offsets where a pattern occurs
/// with at most `mismatches` substitutions.
pub trait Matcher {
    fn find(&self, pattern: &[u8], mismatches: usize) -> Vec<usize>;
}

impl Matcher for SequenceIndex {
    fn find(&self, pattern: &[u8], mismatches: usize) -> Vec<usize> {
        if mismatches == 0 {
            fm_index::search_exact(self, pattern)
        } else {
            fm_index::search_mismatches(self, pattern, mismatches)
        }
    }
}
