// Target sequences: loading, validation and the transient index
//
// A target sequence is a named string over A, C, G, N, T. During a scan pass
// it lends its residues to a SequenceIndex through IndexedSequence, which
// gives them back (by inverting the BWT) when it goes out of scope.

use crate::alphabet::base_to_rank;
use crate::defaults::OCC_BLOCK_SIZE;
use crate::error::{NucError, ResourceContext, Result};
use crate::index::{Matcher, SequenceIndex};
use crate::utils::{is_sequence_file, stem, xzopen};
use bio::io::fasta;
use std::fs;
use std::io::{BufRead, Read};
use std::path::Path;

/// Delimiters ending a name taken from the start of a FASTA header.
const HEADER_NAME_END: &[char] = &[' ', '|', '/', '\\', ';', '.', ','];
/// Delimiters ending a `name=` token.
const NAME_TOKEN_END: &[char] = &[';', ' ', '|', '/', '\\', '.', ','];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSequence {
    name: String,
    residues: Vec<u8>,
}

impl TargetSequence {
    /// Upper-cases and validates `residues`; the name is lower-cased.
    pub fn new(name: &str, residues: impl AsRef<[u8]>) -> Result<Self> {
        let name = name.trim().to_lowercase();
        let residues: Vec<u8> = residues.as_ref().to_ascii_uppercase();
        if name.is_empty() || residues.is_empty() {
            return Err(NucError::validation("Empty name or sequence."));
        }
        if let Some(pos) = residues.iter().position(|&b| base_to_rank(b).is_none()) {
            return Err(NucError::validation(format!(
                "Invalid character '{}' at position {} of sequence {}",
                residues[pos] as char, pos, name
            )));
        }
        Ok(TargetSequence { name, residues })
    }

    /// Parse an inline `NAME=SEQ` value.
    pub fn from_inline(value: &str) -> Result<Self> {
        match value.split_once('=') {
            Some((name, seq)) => Self::new(name, seq.trim()),
            None => Err(NucError::validation(format!(
                "Inline sequence must be NAME=SEQ, got '{}'",
                value
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: String) {
        self.name = name;
    }

    /// Residues; empty while an [`IndexedSequence`] holds them.
    pub fn residues(&self) -> &[u8] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Hand the residues to a freshly built index.
    pub fn index(&mut self) -> Result<IndexedSequence<'_>> {
        self.index_with_block_size(OCC_BLOCK_SIZE)
    }

    pub fn index_with_block_size(&mut self, block_size: usize) -> Result<IndexedSequence<'_>> {
        let index = SequenceIndex::build_with_block_size(&self.residues, block_size)?;
        log::debug!(
            "Indexed {} ({} bases, {} bytes)",
            self.name,
            self.residues.len(),
            index.size_in_bytes()
        );
        self.residues = Vec::new();
        Ok(IndexedSequence {
            target: self,
            index: Some(index),
        })
    }

    /// Load every sequence of a file: a FASTA collection when the first line
    /// starts with `>`, otherwise a single record named after the file.
    pub fn from_file(path: &Path) -> Result<Vec<Self>> {
        let mut reader = xzopen(path).at_path(path)?;
        let is_fasta = reader.fill_buf().at_path(path)?.first() == Some(&b'>');
        if is_fasta {
            read_fasta(path, reader)
        } else {
            read_single(path, reader).map(|seq| vec![seq])
        }
    }
}

/// Index of a target sequence; restores the residues when dropped.
pub struct IndexedSequence<'a> {
    target: &'a mut TargetSequence,
    index: Option<SequenceIndex>,
}

impl IndexedSequence<'_> {
    pub fn name(&self) -> &str {
        &self.target.name
    }

    pub fn index(&self) -> Option<&SequenceIndex> {
        self.index.as_ref()
    }
}

impl Matcher for IndexedSequence<'_> {
    fn find(&self, pattern: &[u8], mismatches: usize) -> Vec<usize> {
        match &self.index {
            Some(index) => index.find(pattern, mismatches),
            None => Vec::new(),
        }
    }
}

impl Drop for IndexedSequence<'_> {
    fn drop(&mut self) {
        if let Some(index) = self.index.take() {
            self.target.residues = index.invert();
        }
    }
}

/// Name of a FASTA record from its header line (without `>`).
pub fn header_name(header: &str) -> &str {
    let (rest, ends) = match header.find("name=") {
        Some(pos) => (&header[pos + 5..], NAME_TOKEN_END),
        None => (header, HEADER_NAME_END),
    };
    match rest.find(ends) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

fn read_fasta(path: &Path, reader: Box<dyn BufRead>) -> Result<Vec<TargetSequence>> {
    let mut sequences = Vec::new();
    for record in fasta::Reader::new(reader).records() {
        let record = record.map_err(|e| {
            NucError::validation(format!("Malformed FASTA file {}: {}", path.display(), e))
        })?;
        let header = match record.desc() {
            Some(desc) => format!("{} {}", record.id(), desc),
            None => record.id().to_string(),
        };
        let name = header_name(&header);
        if name.is_empty() || record.seq().is_empty() {
            return Err(NucError::validation(format!(
                "Empty name or sequence (FASTA file {}).",
                path.display()
            )));
        }
        sequences.push(TargetSequence::new(name, record.seq())?);
    }
    log::debug!("Read {} records from {}", sequences.len(), path.display());
    Ok(sequences)
}

fn read_single(path: &Path, mut reader: Box<dyn BufRead>) -> Result<TargetSequence> {
    let mut content = Vec::new();
    reader.read_to_end(&mut content).at_path(path)?;
    let residues: Vec<u8> = content
        .split(|&b| b == b'\n')
        .flat_map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .copied()
        .collect();
    let name = stem(path).unwrap_or_default();
    TargetSequence::new(&name, residues)
}

/// Gather sequences from files, directories (every `*.txt`, `*.fa`,
/// `*.fasta` entry) and inline `NAME=SEQ` values.
///
/// The result is sorted by name; of several sequences sharing a name only
/// the first one given is kept.
pub fn collect_sequences<P: AsRef<Path>>(paths: &[P], inline: &[String]) -> Result<Vec<TargetSequence>> {
    let mut sequences = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let mut entries: Vec<_> = fs::read_dir(path)
                .at_path(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_sequence_file(p))
                .collect();
            entries.sort();
            for entry in entries {
                sequences.extend(TargetSequence::from_file(&entry)?);
            }
        } else {
            sequences.extend(TargetSequence::from_file(path)?);
        }
    }
    for value in inline {
        sequences.push(TargetSequence::from_inline(value)?);
    }

    let before = sequences.len();
    sequences.sort_by(|a, b| a.name.cmp(&b.name));
    sequences.dedup_by(|later, first| later.name == first.name);
    if sequences.len() < before {
        log::warn!("Dropped {} sequence(s) with duplicate names", before - sequences.len());
    }
    Ok(sequences)
}
