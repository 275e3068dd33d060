// Ambiguity-code expansion of the reference table
//
// A table whose words carry any of U, K, S, Y, M, W, R, B, D, H, V, N is
// rewritten once, before searching, so that every row holds a concrete word
// over A, C, G, T. The original file is kept next to it with a `.old`
// suffix.

use crate::alphabet::concrete_bases;
use crate::error::{NucError, ResourceContext, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Number of concrete words `word` expands to.
pub fn expansion_count(word: &[u8]) -> usize {
    word.iter()
        .map(|&b| concrete_bases(b.to_ascii_uppercase()).map_or(1, <[u8]>::len))
        .product()
}

/// Every concrete word `word` stands for.
///
/// The first ambiguous position varies slowest; substitutions follow the
/// order of [`concrete_bases`].
pub fn expand_word(word: &[u8]) -> Vec<String> {
    let mut variants: Vec<Vec<u8>> = vec![Vec::with_capacity(word.len())];
    for &raw in word {
        let b = raw.to_ascii_uppercase();
        let choices: &[u8] = match concrete_bases(b) {
            Some(bases) => bases,
            None => std::slice::from_ref(&b),
        };
        if choices.len() == 1 {
            for v in variants.iter_mut() {
                v.push(choices[0]);
            }
            continue;
        }
        let mut next = Vec::with_capacity(variants.len() * choices.len());
        for v in &variants {
            for &c in choices {
                let mut grown = v.clone();
                grown.push(c);
                next.push(grown);
            }
        }
        variants = next;
    }
    variants
        .into_iter()
        .map(|v| String::from_utf8_lossy(&v).into_owned())
        .collect()
}

/// Path of the backup kept after a rewrite (`<table>.old`).
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".old");
    PathBuf::from(name)
}

/// Rewrite the table at `path` with every word expanded.
///
/// Writes to a temporary file in the same directory, removes a stale backup,
/// moves the original to the backup path and promotes the temporary file.
/// Returns the new number of data rows.
pub fn expand_table(path: &Path, labelled: bool) -> Result<usize> {
    let input = File::open(path).at_path(path)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let tmp = NamedTempFile::new_in(&dir).at_path(&dir)?;

    let mut rows = 0usize;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        let mut lines = BufReader::new(input).lines();

        if labelled {
            if let Some(header) = lines.next() {
                let header = header.at_path(path)?;
                writeln!(writer, "{}", header.trim_end_matches('\r')).at_path(tmp.path())?;
            }
        }

        for line in lines {
            let line = line.at_path(path)?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let (word, rest) = match line.split_once('\t') {
                Some((w, r)) => (w, Some(r)),
                None => (line, None),
            };
            for variant in expand_word(word.as_bytes()) {
                let written = match rest {
                    Some(rest) => writeln!(writer, "{}\t{}", variant, rest),
                    None => writeln!(writer, "{}", variant),
                };
                written.at_path(tmp.path())?;
                rows += 1;
            }
        }
        writer.flush().at_path(tmp.path())?;
    }

    let backup = backup_path(path);
    match fs::remove_file(&backup) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(NucError::resource(&backup, e)),
    }
    fs::rename(path, &backup).at_path(path)?;
    tmp.persist(path).map_err(|e| NucError::resource(path, e.error))?;

    log::info!(
        "Expanded ambiguity codes in {}: {} rows (original kept as {})",
        path.display(),
        rows,
        backup.display()
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_single_code() {
        assert_eq!(expand_word(b"ACRT"), vec!["ACAT", "ACGT"]);
        assert_eq!(expansion_count(b"ACRT"), 2);
    }

    #[test]
    fn first_ambiguous_position_varies_slowest() {
        assert_eq!(expand_word(b"RY"), vec!["AC", "AT", "GC", "GT"]);
    }

    #[test]
    fn cardinality_is_product_of_codes() {
        // N=4, B=3, K=2, U=1
        let word = b"ANBKU";
        let variants = expand_word(word);
        assert_eq!(variants.len(), 24);
        assert_eq!(expansion_count(word), 24);
        assert!(variants.iter().all(|v| v.len() == 5 && v.bytes().all(|b| b"ACGT".contains(&b))));
        let mut unique = variants.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 24);
    }

    #[test]
    fn lower_case_words_are_folded() {
        assert_eq!(expand_word(b"acgu"), vec!["ACGT"]);
    }

    #[test]
    fn backup_path_appends_old() {
        assert_eq!(backup_path(Path::new("db/table.txt")), PathBuf::from("db/table.txt.old"));
    }

    #[test]
    fn rewrites_table_and_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.txt");
        fs::write(&path, "labels\tname\tcol1\r\nACRT\tfirst\t1\r\nGGGG\tsecond\t0\n").unwrap();

        let rows = expand_table(&path, true).unwrap();
        assert_eq!(rows, 3);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert_eq!(rewritten, "labels\tname\tcol1\nACAT\tfirst\t1\nACGT\tfirst\t1\nGGGG\tsecond\t0\n");
        let backup = fs::read_to_string(backup_path(&path)).unwrap();
        assert!(backup.starts_with("labels\tname\tcol1\r\nACRT"));
    }
}
