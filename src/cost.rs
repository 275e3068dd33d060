// Strategy choice between the per-sequence FM-index and the plain scan.
//
// The estimates only pick the faster path; both produce the same offsets.

/// How the target sequences are searched during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Indexed,
    Naive,
}

/// Requested strategy: let the cost model decide, or force one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyChoice {
    #[default]
    Auto,
    Indexed,
    Naive,
}

/// Inputs of the cost estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostInputs {
    pub reference_rows: usize,
    pub max_sequence_len: usize,
    pub mean_sequence_len: f64,
    pub max_word_len: usize,
    pub mismatches: usize,
}

impl CostInputs {
    pub fn from_lengths(reference_rows: usize, max_word_len: usize, mismatches: usize, lengths: &[usize]) -> Self {
        let max_sequence_len = lengths.iter().copied().max().unwrap_or(0);
        let mean_sequence_len = if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
        };
        CostInputs {
            reference_rows,
            max_sequence_len,
            mean_sequence_len,
            max_word_len,
            mismatches,
        }
    }

    /// Per-row operation estimate for the indexed search.
    pub fn indexed_row_cost(&self) -> f64 {
        let word = self.max_word_len as f64;
        if self.mismatches == 0 {
            return word;
        }
        // ln(n) - ln(4): expected depth before the interval collapses
        let depth = ((self.max_sequence_len.max(1) as f64).ln() - 4f64.ln()).max(0.0);
        let kept = self.max_word_len.saturating_sub(self.mismatches) as f64;
        let branching = word * kept * 4f64.powi(self.mismatches as i32) * depth;
        let ceiling = word * self.max_sequence_len as f64 * depth;
        branching.min(ceiling)
    }

    /// Per-row operation estimate for the plain scan.
    pub fn naive_row_cost(&self) -> f64 {
        if self.mismatches == 0 {
            self.mean_sequence_len
        } else {
            self.mean_sequence_len * self.max_word_len as f64
        }
    }

    /// One-off suffix array construction per sequence.
    pub fn index_build_cost(&self) -> f64 {
        let n = self.mean_sequence_len;
        if n > 1.0 { n * n.ln() } else { 0.0 }
    }

    pub fn indexed_total(&self) -> f64 {
        self.reference_rows as f64 * self.indexed_row_cost() + self.index_build_cost()
    }

    pub fn naive_total(&self) -> f64 {
        self.reference_rows as f64 * self.naive_row_cost()
    }

    /// Indexed search unless it is estimated to be strictly more expensive.
    pub fn choose(&self) -> Strategy {
        if self.indexed_total() > self.naive_total() {
            Strategy::Naive
        } else {
            Strategy::Indexed
        }
    }
}

impl StrategyChoice {
    pub fn resolve(self, inputs: &CostInputs) -> Strategy {
        match self {
            StrategyChoice::Auto => inputs.choose(),
            StrategyChoice::Indexed => Strategy::Indexed,
            StrategyChoice::Naive => Strategy::Naive,
        }
    }
}
