// Reference table: tab-separated rows whose first field is the word to
// search for.
//
// The table is validated (and expanded when it carries ambiguity codes) once
// on open; scans then stream it from disk with `rows()`, once per target
// sequence.

use crate::alphabet::{is_ambiguous, is_reference_char};
use crate::error::{NucError, ResourceContext, Result};
use crate::expand;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Value of column 0 for single-column tables: every row participates.
const IMPLICIT_VALUE: &str = "1";

/// Participation mask: rows with this value are skipped for the column.
pub const MASKED_VALUE: &str = "0";

#[derive(Debug, Clone)]
pub struct ReferenceTable {
    path: PathBuf,
    name: String,
    labels: Vec<String>,
    labelled: bool,
    name_col: usize,
    mapnum_col: usize,
    row_count: usize,
    max_word_len: usize,
    expanded: bool,
}

/// One data row of the table.
#[derive(Debug, Clone)]
pub struct TableRow {
    /// 1-based line number in the file
    pub line: usize,
    fields: Vec<String>,
}

impl TableRow {
    fn parse(line: usize, text: &str) -> Self {
        TableRow {
            line,
            fields: text.split('\t').map(str::to_string).collect(),
        }
    }

    /// The word, upper-cased.
    pub fn word(&self) -> String {
        self.fields[0].to_ascii_uppercase()
    }

    pub fn field(&self, col: usize) -> &str {
        self.fields.get(col).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Streaming iterator over the data rows (header and blank lines skipped).
pub struct TableRows {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    line: usize,
}

impl Iterator for TableRows {
    type Item = Result<TableRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(NucError::resource(&self.path, e))),
            };
            self.line += 1;
            let text = line.trim_end_matches('\r');
            if !text.is_empty() {
                return Some(Ok(TableRow::parse(self.line, text)));
            }
        }
    }
}

/// File stem used as the table name ("data" when there is none).
fn stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "data".to_string())
}

fn validate_word(word: &str, line: usize) -> Result<bool> {
    if word.is_empty() {
        return Err(NucError::validation(format!("Empty word on line {} of the database", line)));
    }
    let mut ambiguous = false;
    for b in word.bytes() {
        let b = b.to_ascii_uppercase();
        if !is_reference_char(b) {
            return Err(NucError::validation(format!(
                "Invalid characters in the database: '{}' on line {}",
                b as char, line
            )));
        }
        ambiguous |= is_ambiguous(b);
    }
    Ok(ambiguous)
}

impl ReferenceTable {
    /// Open, validate and (if needed) expand a reference table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).at_path(path)?;
        let name = stem_name(path);

        let mut lines = BufReader::new(file).lines();
        let first = match lines.next() {
            Some(line) => line.at_path(path)?,
            None => return Err(NucError::validation(format!("Empty database: {}", path.display()))),
        };
        let first = first.trim_end_matches('\r');
        if first.is_empty() {
            return Err(NucError::validation(format!(
                "Empty first line in database: {}",
                path.display()
            )));
        }

        let header: Vec<&str> = first.split('\t').collect();
        let lowered: Vec<String> = header.iter().map(|f| f.to_lowercase()).collect();
        let labelled = lowered[0] == "labels";

        let mut table = ReferenceTable {
            path: path.to_path_buf(),
            name: name.clone(),
            labels: Vec::new(),
            labelled,
            name_col: 0,
            mapnum_col: 0,
            row_count: 0,
            max_word_len: 0,
            expanded: false,
        };
        let mut ambiguous = false;

        if labelled {
            if header.len() > 1 {
                for (i, label) in lowered.iter().enumerate() {
                    match label.as_str() {
                        "mapnum" => table.mapnum_col = i,
                        "name" => table.name_col = i,
                        _ => {}
                    }
                }
                table.labels = lowered;
            } else {
                table.labels = vec![name];
            }
        } else {
            table.labels = match header.len() {
                1 => vec![name],
                2 => vec!["labels".to_string(), name],
                n => (0..n).map(|i| format!("Column {}", i)).collect(),
            };
            ambiguous |= validate_word(header[0], 1)?;
            table.max_word_len = header[0].len();
            table.row_count = 1;
        }

        let width = table.labels.len();
        for (i, line) in lines.enumerate() {
            let line_no = i + 2;
            let line = line.at_path(path)?;
            let text = line.trim_end_matches('\r');
            if text.is_empty() {
                continue;
            }
            let row = TableRow::parse(line_no, text);
            if row.len() < width {
                return Err(NucError::validation(format!(
                    "Malformed database: line {} has {} fields, expected {}",
                    line_no,
                    row.len(),
                    width
                )));
            }
            ambiguous |= validate_word(&row.fields[0], line_no)?;
            table.max_word_len = table.max_word_len.max(row.fields[0].len());
            table.row_count += 1;
        }

        if ambiguous {
            table.row_count = expand::expand_table(path, labelled)?;
            table.expanded = true;
        }

        log::info!(
            "Loaded database {} ({} rows, {} columns, longest word {})",
            path.display(),
            table.row_count,
            table.labels.len(),
            table.max_word_len
        );
        Ok(table)
    }

    /// Stream the data rows from disk.
    pub fn rows(&self) -> Result<TableRows> {
        let file = File::open(&self.path).at_path(&self.path)?;
        let mut lines = BufReader::new(file).lines();
        let mut line = 0;
        if self.labelled {
            if let Some(header) = lines.next() {
                header.at_path(&self.path)?;
            }
            line = 1;
        }
        Ok(TableRows {
            lines,
            path: self.path.clone(),
            line,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, col: usize) -> &str {
        &self.labels[col]
    }

    pub fn is_labelled(&self) -> bool {
        self.labelled
    }

    pub fn was_expanded(&self) -> bool {
        self.expanded
    }

    /// Index of the `name` column, 0 when absent.
    pub fn name_col(&self) -> usize {
        self.name_col
    }

    /// Index of the `mapnum` column, 0 when absent.
    pub fn mapnum_col(&self) -> usize {
        self.mapnum_col
    }

    pub fn has_mapnum(&self) -> bool {
        self.mapnum_col > 0
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn max_word_len(&self) -> usize {
        self.max_word_len
    }

    /// Columns a scan may select: every labelled column after the first, or
    /// the implicit column 0 when the table has a single label.
    pub fn selectable_columns(&self) -> Vec<usize> {
        if self.labels.len() == 1 {
            vec![0]
        } else {
            (1..self.labels.len()).collect()
        }
    }

    /// Keep the selectable columns of `requested` (all of them when empty).
    pub fn check_columns(&self, requested: &[usize]) -> Vec<usize> {
        let selectable = self.selectable_columns();
        if requested.is_empty() {
            return selectable;
        }
        let mut kept = Vec::with_capacity(requested.len());
        for &col in requested {
            if selectable.contains(&col) {
                if !kept.contains(&col) {
                    kept.push(col);
                }
            } else {
                log::warn!("Ignoring column {}: not a selectable column of {}", col, self.name);
            }
        }
        kept
    }

    /// Name reported for a row: the `name` field, or the word itself.
    pub fn row_name<'a>(&self, row: &'a TableRow) -> &'a str {
        row.field(self.name_col)
    }

    /// Value of `col` for a row; column 0 is the implicit constant `1`.
    pub fn column_value<'a>(&self, row: &'a TableRow, col: usize) -> &'a str {
        if col == 0 { IMPLICIT_VALUE } else { row.field(col) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_table(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn labelled_table_finds_special_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(
            dir.path(),
            "pirna.txt",
            "Labels\tName\tOvary\tTestis\tMapNum\r\nACGT\tp1\t1\t0\t7\r\n\r\nTTGCA\tp2\t0\t1\t3\r\n",
        );
        let table = ReferenceTable::open(&path).unwrap();

        assert!(table.is_labelled());
        assert_eq!(table.labels(), &["labels", "name", "ovary", "testis", "mapnum"]);
        assert_eq!(table.name_col(), 1);
        assert_eq!(table.mapnum_col(), 4);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.max_word_len(), 5);
        assert!(!table.was_expanded());

        let rows: Vec<TableRow> = table.rows().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(table.row_name(&rows[1]), "p2");
        assert_eq!(table.column_value(&rows[0], 3), "0");
        assert_eq!(rows[1].line, 4);
    }

    #[test]
    fn unlabelled_tables_get_generic_labels() {
        let dir = tempfile::tempdir().unwrap();
        let one = ReferenceTable::open(write_table(dir.path(), "words.txt", "acgt\nGGCA\n")).unwrap();
        assert_eq!(one.labels(), &["words"]);
        assert_eq!(one.row_count(), 2);
        assert_eq!(one.selectable_columns(), vec![0]);

        let two = ReferenceTable::open(write_table(dir.path(), "counts.txt", "ACGT\t4\n")).unwrap();
        assert_eq!(two.labels(), &["labels", "counts"]);
        assert_eq!(two.selectable_columns(), vec![1]);

        let three = ReferenceTable::open(write_table(dir.path(), "wide.txt", "ACGT\t1\t2\n")).unwrap();
        assert_eq!(three.labels(), &["Column 0", "Column 1", "Column 2"]);
        assert_eq!(three.check_columns(&[2, 5, 0, 2]), vec![2]);
        assert_eq!(three.check_columns(&[]), vec![1, 2]);
    }

    #[test]
    fn single_column_rows_use_the_implicit_value() {
        let dir = tempfile::tempdir().unwrap();
        let table = ReferenceTable::open(write_table(dir.path(), "w.txt", "ACGT\n")).unwrap();
        let row = table.rows().unwrap().next().unwrap().unwrap();
        assert_eq!(table.column_value(&row, 0), "1");
        assert_eq!(table.row_name(&row), "ACGT");
    }

    #[test]
    fn invalid_characters_fail_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "bad.txt", "labels\tc1\nACGT\t1\nACXT\t1\n");
        match ReferenceTable::open(&path) {
            Err(NucError::Validation(msg)) => assert!(msg.contains("line 3"), "{msg}"),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn short_rows_fail_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "short.txt", "labels\tname\tc1\nACGT\tp1\n");
        assert!(matches!(ReferenceTable::open(&path), Err(NucError::Validation(_))));
    }

    #[test]
    fn missing_file_is_a_resource_failure() {
        let err = ReferenceTable::open("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, NucError::Resource { .. }));
    }

    #[test]
    fn ambiguous_table_is_expanded_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "amb.txt", "labels\tc1\nACRT\t1\nNNA\t2\n");
        let table = ReferenceTable::open(&path).unwrap();

        assert!(table.was_expanded());
        assert_eq!(table.row_count(), 2 + 16);
        let words: Vec<String> = table.rows().unwrap().map(|r| r.unwrap().word()).collect();
        assert_eq!(&words[..2], &["ACAT", "ACGT"]);
        assert!(words.iter().all(|w| w.bytes().all(|b| b"ACGT".contains(&b))));
        assert!(expand::backup_path(&path).exists());
    }
}
