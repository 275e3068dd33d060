// Masked copies of a target sequence: every base covered by a matching base
// of a reported hit becomes '*'. Hits are read back from the GFF3 file of the
// same column.

use super::output::{OutputFile, gff_path, masked_path};
use crate::alphabet::reverse_complement_bytes;
use crate::defaults::MASKED_LINE_WIDTH;
use crate::error::{NucError, ResourceContext, Result};
use crate::sequence::TargetSequence;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const MASK: u8 = b'*';

/// One hit as written to the GFF3 file.
#[derive(Debug, PartialEq, Eq)]
struct GffHit {
    start: usize,
    end: usize,
    sense: bool,
    word: Vec<u8>,
}

fn parse_hit(line: &str, line_no: usize, path: &Path) -> Result<GffHit> {
    let malformed = || NucError::validation(format!("Malformed GFF3 line {} in {}", line_no, path.display()));
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 9 {
        return Err(malformed());
    }
    let start: usize = fields[3].parse().map_err(|_| malformed())?;
    let end: usize = fields[4].parse().map_err(|_| malformed())?;
    let name = fields[8]
        .split(';')
        .find_map(|attr| attr.strip_prefix("Name="))
        .ok_or_else(malformed)?;
    if start == 0 || end < start || name.len() != end - start + 1 {
        return Err(malformed());
    }
    Ok(GffHit {
        start: start - 1,
        end: end - 1,
        sense: fields[6] == "+",
        word: name.as_bytes().to_vec(),
    })
}

/// Apply one hit to the sense and antisense copies.
///
/// Antisense hits carry the reverse complement of the row word, so they are
/// compared, in row orientation, against the reverse complement strand.
fn apply_hit(hit: &GffHit, sense: &mut [u8], antisense: &mut [u8]) -> bool {
    let n = sense.len();
    if hit.end >= n {
        return false;
    }
    let (strand, word, from) = if hit.sense {
        (sense, hit.word.clone(), hit.start)
    } else {
        (antisense, reverse_complement_bytes(&hit.word), n - 1 - hit.end)
    };
    for (i, &b) in word.iter().enumerate() {
        if strand[from + i] == b {
            strand[from + i] = MASK;
        }
    }
    true
}

fn write_wrapped(out: &mut OutputFile, residues: &[u8]) -> Result<()> {
    for chunk in residues.chunks(MASKED_LINE_WIDTH) {
        out.line(format_args!("{}", String::from_utf8_lossy(chunk)))?;
    }
    Ok(())
}

/// Write `<dir>/<seq>_<label>.txt` from `<dir>/<seq>_<label>.gff3`.
pub fn write_masked(dir: &Path, seq: &TargetSequence, label: &str) -> Result<()> {
    let gff = gff_path(dir, seq.name(), label);
    let reader = BufReader::new(File::open(&gff).at_path(&gff)?);

    let mut sense = seq.residues().to_vec();
    let mut antisense = reverse_complement_bytes(seq.residues());
    for (i, line) in reader.lines().enumerate() {
        let line = line.at_path(&gff)?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let hit = parse_hit(&line, i + 1, &gff)?;
        if !apply_hit(&hit, &mut sense, &mut antisense) {
            log::warn!("{}: hit at {}..{} lies outside {}", gff.display(), hit.start + 1, hit.end + 1, seq.name());
        }
    }

    let mut out = OutputFile::create(masked_path(dir, seq.name(), label))?;
    out.line(format_args!(">{} (sense)", seq.name()))?;
    write_wrapped(&mut out, &sense)?;
    out.line(format_args!(">{} (antisense)", seq.name()))?;
    write_wrapped(&mut out, &antisense)?;
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_gff_hits() {
        let hit = parse_hit(
            "chr1\tNucBase\tpiRNA\t2\t5\t.\t-\t.\tName=TACG;Alias=p1",
            4,
            Path::new("x.gff3"),
        )
        .unwrap();
        assert_eq!(
            hit,
            GffHit {
                start: 1,
                end: 4,
                sense: false,
                word: b"TACG".to_vec()
            }
        );
        assert!(parse_hit("chr1\tNucBase\tpiRNA\t2\t9\t.\t+\t.\tName=TACG", 4, Path::new("x.gff3")).is_err());
    }

    #[test]
    fn masks_both_strands() {
        let dir = tempfile::tempdir().unwrap();
        let seq = TargetSequence::new("chr1", "ACGTACGA").unwrap();
        fs::write(
            dir.path().join("chr1_c1.gff3"),
            "##gff_version 3\n##Index_subfeatures 1\n\n\
             chr1\tNucBase\tpiRNA\t2\t5\t.\t+\t.\tName=CGTA;Alias=p1\n\
             chr1\tNucBase\tpiRNA\t4\t7\t.\t-\t.\tName=TACG;Alias=p2\n",
        )
        .unwrap();

        write_masked(dir.path(), &seq, "c1").unwrap();

        // reverse complement of ACGTACGA is TCGTACGT; the antisense hit at
        // 4..7 covers its positions 1..4 (CGTA)
        let masked = fs::read_to_string(dir.path().join("chr1_c1.txt")).unwrap();
        assert_eq!(masked, ">chr1 (sense)\nA****CGA\n>chr1 (antisense)\nT****CGT\n");
    }

    #[test]
    fn wraps_long_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let seq = TargetSequence::new("long", "A".repeat(100)).unwrap();
        fs::write(dir.path().join("long_c1.gff3"), "##gff_version 3\n##Index_subfeatures 1\n\n").unwrap();

        write_masked(dir.path(), &seq, "c1").unwrap();

        let masked = fs::read_to_string(dir.path().join("long_c1.txt")).unwrap();
        let lines: Vec<&str> = masked.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2].len(), 20);
        assert_eq!(lines[4], "T".repeat(80));
    }
}
