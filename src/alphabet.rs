// Nucleotide alphabets shared by the reference table, the target sequences
// and the index.
//
// Index ranks follow byte order so that the terminator sorts first:
//   $=0, A=1, C=2, G=3, N=4, T=5

/// Number of index symbols, terminator included.
pub const SIGMA: usize = 6;

/// Rank of the terminator symbol appended before indexing.
pub const TERMINATOR: u8 = 0;

/// Bases a target sequence may contain, in rank order (ranks 1..SIGMA).
pub const TARGET_BASES: [u8; SIGMA - 1] = [b'A', b'C', b'G', b'N', b'T'];

/// Characters accepted in the first field of a reference row.
pub const REFERENCE_CHARS: &[u8] = b"ACGTUKSYMWRBDHVN";

/// Characters that force an expansion of the reference table.
pub const AMBIGUITY_CHARS: &[u8] = b"UKSYMWRBDHVN";

/// Map a target base to its index rank. Returns `None` outside `ACGNT`.
#[inline(always)]
pub fn base_to_rank(b: u8) -> Option<u8> {
    match b {
        b'A' => Some(1),
        b'C' => Some(2),
        b'G' => Some(3),
        b'N' => Some(4),
        b'T' => Some(5),
        _ => None,
    }
}

/// Inverse of [`base_to_rank`]. The terminator maps to `$`.
#[inline(always)]
pub fn rank_to_base(r: u8) -> u8 {
    match r {
        1 => b'A',
        2 => b'C',
        3 => b'G',
        4 => b'N',
        5 => b'T',
        _ => b'$',
    }
}

/// Concrete bases an ambiguity-coded character stands for.
///
/// Concrete bases map to themselves. Order matters: table expansion
/// enumerates substitutions in exactly this order.
pub fn concrete_bases(b: u8) -> Option<&'static [u8]> {
    let bases: &'static [u8] = match b {
        b'A' => b"A",
        b'C' => b"C",
        b'G' => b"G",
        b'T' => b"T",
        b'U' => b"T",
        b'K' => b"GT",
        b'S' => b"GC",
        b'Y' => b"CT",
        b'M' => b"AC",
        b'W' => b"AT",
        b'R' => b"AG",
        b'B' => b"CGT",
        b'D' => b"AGT",
        b'H' => b"ACT",
        b'V' => b"ACG",
        b'N' => b"ACGT",
        _ => return None,
    };
    Some(bases)
}

pub fn is_ambiguous(b: u8) -> bool {
    AMBIGUITY_CHARS.contains(&b)
}

pub fn is_reference_char(b: u8) -> bool {
    REFERENCE_CHARS.contains(&b)
}

/// Watson-Crick complement; anything but A, C, G, T becomes N.
#[inline]
pub fn complement(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        _ => b'N',
    }
}

/// Reverse complement of a pattern (T<->A, G<->C, anything else -> N).
pub fn reverse_complement(seq: &str) -> String {
    seq.bytes().rev().map(|b| complement(b) as char).collect()
}

pub fn reverse_complement_bytes(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}
