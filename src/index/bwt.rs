use crate::alphabet::{SIGMA, TERMINATOR, base_to_rank, rank_to_base};
use crate::defaults::OCC_BLOCK_SIZE;
use crate::error::{NucError, Result};
use crate::index::fm_index::get_occ;

/// Suffix array, BWT, C-table and blocked occurrence table of one target
/// sequence with a terminator appended.
///
/// The index owns everything needed to reproduce the sequence:
/// [`SequenceIndex::invert`] walks the LF-mapping from the terminator row
/// and rebuilds the residues without touching the suffix array.
#[derive(Debug)]
pub struct SequenceIndex {
    /// Row of the BWT holding the terminator (the row where SA == 0)
    pub primary: usize,
    /// C(): number of symbols in the text smaller than each rank
    pub cumulative_count: [usize; SIGMA],
    /// Text length including the terminator
    pub seq_len: usize,
    /// BWT, one rank per byte
    pub bwt_data: Vec<u8>,
    /// Full suffix array of the terminated text
    pub suffix_array: Vec<usize>,
    /// occ[k][c] = occurrences of rank c in bwt_data[0..k * block_size]
    pub occ: Vec<[u32; SIGMA]>,
    pub block_size: usize,
}

#[path = "bwt_test.rs"]
mod bwt_test;

impl SequenceIndex {
    pub fn build(residues: &[u8]) -> Result<Self> {
        Self::build_with_block_size(residues, OCC_BLOCK_SIZE)
    }

    pub fn build_with_block_size(residues: &[u8], block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(NucError::Unexpected("occurrence block size must be positive".into()));
        }
        if residues.len() >= u32::MAX as usize {
            return Err(NucError::validation(format!(
                "Sequence of {} bases is too long to index",
                residues.len()
            )));
        }

        // Ranks 1..SIGMA for bases, 0 for the terminator: the suffix array
        // construction needs a unique, lexicographically smallest sentinel.
        let mut text: Vec<u8> = Vec::with_capacity(residues.len() + 1);
        for (pos, &b) in residues.iter().enumerate() {
            let rank = base_to_rank(b).ok_or_else(|| {
                NucError::validation(format!(
                    "Invalid character '{}' at position {} of the indexed sequence",
                    b as char, pos
                ))
            })?;
            text.push(rank);
        }
        text.push(TERMINATOR);

        use bio::data_structures::suffix_array::suffix_array;
        let sa = suffix_array(&text);
        let seq_len = text.len();

        // BWT[i] = text[SA[i] - 1]; the row whose suffix is the whole text
        // wraps around to the terminator.
        let mut bwt_data = Vec::with_capacity(seq_len);
        let mut primary = 0usize;
        for (i, &sa_val) in sa.iter().enumerate() {
            if sa_val == 0 {
                primary = i;
                bwt_data.push(text[seq_len - 1]);
            } else {
                bwt_data.push(text[sa_val - 1]);
            }
        }

        let mut counts = [0usize; SIGMA];
        for &c in &bwt_data {
            counts[c as usize] += 1;
        }
        let mut cumulative_count = [0usize; SIGMA];
        for c in 1..SIGMA {
            cumulative_count[c] = cumulative_count[c - 1] + counts[c - 1];
        }

        let occ = Self::calculate_occ(&bwt_data, block_size);

        log::trace!(
            "Indexed {} symbols: primary={}, {} occurrence blocks of {}",
            seq_len,
            primary,
            occ.len(),
            block_size
        );

        Ok(SequenceIndex {
            primary,
            cumulative_count,
            seq_len,
            bwt_data,
            suffix_array: sa,
            occ,
            block_size,
        })
    }

    /// Cumulative symbol counts at the start of every block.
    ///
    /// One entry per block boundary up to and including the block that
    /// contains position `bwt.len()`, so rank queries at the right end of
    /// the full interval stay in range.
    fn calculate_occ(bwt: &[u8], block_size: usize) -> Vec<[u32; SIGMA]> {
        let n_blocks = bwt.len() / block_size;
        let mut occ: Vec<[u32; SIGMA]> = Vec::with_capacity(n_blocks + 1);
        let mut running = [0u32; SIGMA];
        occ.push(running);
        for block in bwt.chunks(block_size).take(n_blocks) {
            for &c in block {
                running[c as usize] += 1;
            }
            occ.push(running);
        }
        occ
    }

    /// Number of indexed residues (terminator excluded).
    pub fn text_len(&self) -> usize {
        self.seq_len - 1
    }

    /// LF-mapping: row of the suffix that starts one position earlier.
    #[inline(always)]
    pub fn lf(&self, row: usize) -> usize {
        let c = self.bwt_data[row];
        self.cumulative_count[c as usize] + get_occ(self, row, c)
    }

    /// Inverse BWT. Consumes the index and returns the original residues.
    pub fn invert(self) -> Vec<u8> {
        let text_len = self.text_len();
        let mut residues = vec![0u8; text_len];

        // Row 0 is the terminator suffix; its BWT symbol is the last base.
        let mut row = 0usize;
        for k in (0..text_len).rev() {
            residues[k] = rank_to_base(self.bwt_data[row]);
            row = self.lf(row);
        }
        debug_assert_eq!(row, self.primary, "LF walk must end on the primary row");

        residues
    }

    /// Approximate heap footprint in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.bwt_data.len()
            + self.suffix_array.len() * std::mem::size_of::<usize>()
            + self.occ.len() * std::mem::size_of::<[u32; SIGMA]>()
    }
}
