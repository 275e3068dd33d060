// Result files written for one (sequence, column) pair, and the
// cross-sequence map-number summary.

use crate::alphabet::reverse_complement;
use crate::defaults::{GFF_FEATURE, GFF_SOURCE};
use crate::error::{ResourceContext, Result};
use crate::query::{Query, Strand};
use crate::table::{MASKED_VALUE, ReferenceTable};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A buffered output file that remembers its path for error reporting.
pub struct OutputFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl OutputFile {
    pub fn create(path: PathBuf) -> Result<Self> {
        let file = File::create(&path).at_path(&path)?;
        Ok(OutputFile {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn line(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.writer.write_fmt(args).at_path(&self.path)?;
        self.writer.write_all(b"\n").at_path(&self.path)
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush().at_path(&self.path)
    }
}

/// `<dir>/<seq>_<label>.gff3`
pub fn gff_path(dir: &Path, seq_name: &str, label: &str) -> PathBuf {
    dir.join(format!("{}_{}.gff3", seq_name, label))
}

/// `<dir>/<seq>_<label>.txt`, the masked-sequence file.
pub fn masked_path(dir: &Path, seq_name: &str, label: &str) -> PathBuf {
    dir.join(format!("{}_{}.txt", seq_name, label))
}

/// `<out>/<label>_<n>seqs_mapnum.txt`
pub fn aggregate_path(out: &Path, label: &str, nseq: usize) -> PathBuf {
    out.join(format!("{}_{}seqs_mapnum.txt", label, nseq))
}

/// What a table row contributes to the tabular outputs besides its counts.
pub struct RowFields<'a> {
    pub word: &'a str,
    pub value: &'a str,
    /// Present only when the table has a `mapnum` column
    pub mapnum: Option<&'a str>,
}

/// Output streams of one column of one target sequence.
pub struct ColumnOutputs {
    seq_name: String,
    absent: bool,
    submatch: bool,
    gff: OutputFile,
    sense: OutputFile,
    antisense: OutputFile,
    mapnum: Option<OutputFile>,
}

/// Header and naming information shared by the four files of a column.
pub struct ColumnSpec<'a> {
    /// Decorated label used in file names
    pub label: &'a str,
    /// Column label as found in the table
    pub column_label: &'a str,
    pub has_mapnum_column: bool,
    pub mapnum_mode: bool,
    pub absent: bool,
    pub submatch: bool,
}

impl ColumnOutputs {
    /// Create the files under `dir` and write their headers.
    pub fn create(dir: &Path, seq_name: &str, spec: &ColumnSpec<'_>) -> Result<Self> {
        let base = format!("{}_{}", seq_name, spec.label);
        let mut gff = OutputFile::create(gff_path(dir, seq_name, spec.label))?;
        let mut sense = OutputFile::create(dir.join(format!("{}_sense.txt", base)))?;
        let mut antisense = OutputFile::create(dir.join(format!("{}_antisense.txt", base)))?;

        gff.line(format_args!("##gff_version 3"))?;
        gff.line(format_args!("##Index_subfeatures 1"))?;
        gff.line(format_args!(""))?;

        let mapnum_header = if spec.has_mapnum_column { "\tmapnum" } else { "" };
        for table in [&mut sense, &mut antisense] {
            table.line(format_args!(
                "labels\t{}_on_{}\t{}{}",
                spec.label, seq_name, spec.column_label, mapnum_header
            ))?;
        }

        let mapnum = if spec.mapnum_mode {
            let mut out = OutputFile::create(dir.join(format!("{}_{}_mapnum.txt", spec.label, seq_name)))?;
            out.line(format_args!("labels\t{}_mapnum\t{}", seq_name, spec.label))?;
            Some(out)
        } else {
            None
        };

        Ok(ColumnOutputs {
            seq_name: seq_name.to_string(),
            absent: spec.absent,
            submatch: spec.submatch,
            gff,
            sense,
            antisense,
            mapnum,
        })
    }

    /// Record both orientations of one row. Returns the row's map number
    /// (hits of both queries and their sub-queries).
    pub fn record(&mut self, sense: &Query, antisense: &Query, row: &RowFields<'_>) -> Result<usize> {
        for query in [sense, antisense] {
            write_gff(&mut self.gff, &self.seq_name, query)?;
        }
        write_table(&mut self.sense, sense, row, self.absent, self.submatch)?;
        write_table(&mut self.antisense, antisense, row, self.absent, self.submatch)?;

        let lsum = sense.total_count() + antisense.total_count();
        if let Some(out) = self.mapnum.as_mut() {
            if (lsum > 0) != self.absent {
                out.line(format_args!("{}\t{}\t{}", row.word, lsum, row.value))?;
            }
        }
        Ok(lsum)
    }

    pub fn finish(self) -> Result<()> {
        self.gff.finish()?;
        self.sense.finish()?;
        self.antisense.finish()?;
        if let Some(out) = self.mapnum {
            out.finish()?;
        }
        Ok(())
    }
}

fn gff_line(out: &mut OutputFile, seq_name: &str, query: &Query, word: &str, offset: usize) -> Result<()> {
    out.line(format_args!(
        "{}\t{}\t{}\t{}\t{}\t.\t{}\t.\tName={};Alias={}",
        seq_name,
        GFF_SOURCE,
        GFF_FEATURE,
        offset + 1,
        offset + word.len(),
        query.strand().symbol(),
        word,
        query.name()
    ))
}

/// One GFF3 feature per hit of the query and of every sub-query.
pub fn write_gff(out: &mut OutputFile, seq_name: &str, query: &Query) -> Result<()> {
    for &offset in query.offsets() {
        gff_line(out, seq_name, query, query.word(), offset)?;
    }
    for sub in query.submatches() {
        for &offset in &sub.offsets {
            gff_line(out, seq_name, query, &sub.word, offset)?;
        }
    }
    Ok(())
}

/// Table row for the query, followed in submatch mode by one line per
/// sub-query and a blank separator.
pub fn write_table(out: &mut OutputFile, query: &Query, row: &RowFields<'_>, absent: bool, submatch: bool) -> Result<()> {
    let count = query.total_count();
    if (count > 0) != absent {
        match row.mapnum {
            Some(mapnum) => out.line(format_args!("{}\t{}\t{}\t{}", query.name(), count, row.value, mapnum))?,
            None => out.line(format_args!("{}\t{}\t{}", query.name(), count, row.value))?,
        }
    }
    if !submatch {
        return Ok(());
    }

    for sub in query.submatches() {
        if (sub.count() > 0) == absent {
            continue;
        }
        // Sub-words are reported in the orientation of the table row
        let word = match query.strand() {
            Strand::Sense => sub.word.clone(),
            Strand::Antisense => reverse_complement(&sub.word),
        };
        out.line(format_args!("{}\t{}", word, sub.count()))?;
    }
    let empty = query.submatches().is_empty() && query.count() == 0;
    if empty == absent {
        out.line(format_args!(""))?;
    }
    Ok(())
}

/// Map numbers of one column summed over every scanned sequence.
///
/// `sums[l]` belongs to the l-th data row of the table.
pub fn write_aggregate(
    path: PathBuf,
    table: &ReferenceTable,
    col: usize,
    label: &str,
    sums: &[usize],
    absent: bool,
) -> Result<()> {
    let mut out = OutputFile::create(path)?;
    out.line(format_args!("labels\tmap_number\t{}", label))?;
    for (l, row) in table.rows()?.enumerate() {
        let row = row?;
        let value = table.column_value(&row, col);
        if value == MASKED_VALUE {
            continue;
        }
        let sum = sums.get(l).copied().unwrap_or(0);
        if (sum > 0) != absent {
            out.line(format_args!("{}\t{}\t{}", row.field(0), sum, value))?;
        }
    }
    out.finish()
}
