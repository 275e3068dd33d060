use super::Matcher;

/// Plain scan over the residues, used when building an index costs more
/// than it saves.
#[derive(Debug, Clone, Copy)]
pub struct NaiveMatcher<'a> {
    text: &'a [u8],
}

impl<'a> NaiveMatcher<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        NaiveMatcher { text }
    }
}

impl Matcher for NaiveMatcher<'_> {
    fn find(&self, pattern: &[u8], mismatches: usize) -> Vec<usize> {
        if mismatches == 0 {
            search_exact(self.text, pattern)
        } else {
            search_mismatches(self.text, pattern, mismatches)
        }
    }
}

/// Every (possibly overlapping) exact occurrence of `pattern`.
pub fn search_exact(text: &[u8], pattern: &[u8]) -> Vec<usize> {
    if pattern.is_empty() || pattern.len() > text.len() {
        return Vec::new();
    }
    text.windows(pattern.len())
        .enumerate()
        .filter(|(_, window)| *window == pattern)
        .map(|(pos, _)| pos)
        .collect()
}

/// Sliding comparison accepting windows with at most `max_mismatches`
/// differing positions.
pub fn search_mismatches(text: &[u8], pattern: &[u8], max_mismatches: usize) -> Vec<usize> {
    if pattern.is_empty() || pattern.len() > text.len() {
        return Vec::new();
    }
    let mut offsets = Vec::new();
    for (pos, window) in text.windows(pattern.len()).enumerate() {
        let mut miss = 0usize;
        for (a, b) in window.iter().zip(pattern) {
            if a != b {
                miss += 1;
                if miss > max_mismatches {
                    break;
                }
            }
        }
        if miss <= max_mismatches {
            offsets.push(pos);
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_scan_reports_overlapping_hits() {
        assert_eq!(search_exact(b"AAAA", b"AA"), vec![0, 1, 2]);
        assert_eq!(search_exact(b"ACGTACGT", b"CGTA"), vec![1]);
        assert!(search_exact(b"ACG", b"ACGT").is_empty());
        assert!(search_exact(b"ACG", b"").is_empty());
    }

    #[test]
    fn mismatch_scan_counts_substitutions() {
        // ACGA vs ACGT at offset 0 and 4: one mismatch each
        assert_eq!(search_mismatches(b"ACGTACGT", b"ACGA", 1), vec![0, 4]);
        assert!(search_mismatches(b"ACGTACGT", b"ACGA", 0).is_empty());
        assert_eq!(search_mismatches(b"ACGTACGT", b"TTTT", 4).len(), 5);
    }

    #[test]
    fn target_n_never_equals_a_pattern_base() {
        assert!(search_exact(b"ACNT", b"ACGT").is_empty());
        assert_eq!(search_mismatches(b"ACNT", b"ACGT", 1), vec![0]);
    }
}
