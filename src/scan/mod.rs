// Scan orchestration: every target sequence against the whole reference
// table.
//
// A run prepares one output directory per sequence, picks the search
// strategy once, then hands each sequence to a rayon worker. A worker builds
// the sequence's index (when indexed search was chosen), streams the table
// from disk, and writes the per-column outputs. The only state shared across
// workers is the optional map-number accumulator.

pub mod mask;
pub mod output;

use crate::cost::{CostInputs, Strategy, StrategyChoice};
use crate::defaults::{MIN_SUBMATCH, MISMATCHES, OUTPUT_FOLDER};
use crate::error::{NucError, ResourceContext, Result};
use crate::index::{Matcher, NaiveMatcher};
use crate::progress::ProgressSink;
use crate::query::{Query, Strand, submatch_active};
use crate::sequence::TargetSequence;
use crate::table::{MASKED_VALUE, ReferenceTable};
use output::{ColumnOutputs, ColumnSpec, RowFields};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Rows processed between two progress updates.
const PROGRESS_BATCH: usize = 256;

/// Options of one scan run.
#[derive(Debug, Clone)]
pub struct ScanOpt {
    pub output_folder: PathBuf,
    /// Table columns to scan; empty means every selectable column
    pub columns: Vec<usize>,
    pub mismatches: usize,
    /// Sub-window length; submatch search is off below 10
    pub min_submatch: usize,
    /// Report rows without hits instead of rows with hits
    pub absent: bool,
    /// Write per-sequence and cross-sequence map numbers
    pub mapnum: bool,
    /// Write masked copies of the sequences after the scan
    pub masked: bool,
    pub threads: usize,
    pub strategy: StrategyChoice,
}

impl Default for ScanOpt {
    fn default() -> Self {
        ScanOpt {
            output_folder: PathBuf::from(OUTPUT_FOLDER),
            columns: Vec::new(),
            mismatches: MISMATCHES,
            min_submatch: MIN_SUBMATCH,
            absent: false,
            mapnum: false,
            masked: false,
            threads: num_cpus::get(),
            strategy: StrategyChoice::default(),
        }
    }
}

impl ScanOpt {
    pub fn submatch(&self) -> bool {
        submatch_active(self.min_submatch)
    }

    /// Label used in output file names for a table column label.
    pub fn decorate(&self, label: &str) -> String {
        let mut decorated = label.to_string();
        if self.absent {
            decorated.push_str("_absent");
        }
        if self.mismatches > 0 {
            decorated.push_str(&format!("_{}mm", self.mismatches));
        }
        if self.submatch() {
            decorated.push_str(&format!("_{}minblock", self.min_submatch));
        }
        decorated
    }
}

/// Outcome of a run.
#[derive(Debug)]
pub struct ScanReport {
    pub strategy: Strategy,
    /// Names (as used in the outputs) of the sequences fully scanned
    pub processed: Vec<String>,
    /// Sequences dropped or abandoned, with the reason
    pub failures: Vec<(String, NucError)>,
    pub cancelled: bool,
}

impl ScanReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Per-row, per-column map numbers summed across sequence workers.
struct MapnumSums {
    columns: Vec<Vec<AtomicUsize>>,
}

impl MapnumSums {
    fn new(ncol: usize, nrows: usize) -> Self {
        MapnumSums {
            columns: (0..ncol)
                .map(|_| (0..nrows).map(|_| AtomicUsize::new(0)).collect())
                .collect(),
        }
    }

    fn add(&self, col: usize, row: usize, value: usize) -> Result<()> {
        let slot = self.columns[col].get(row).ok_or_else(|| {
            NucError::Unexpected(format!(
                "Row {} is past the {} rows counted when the table was loaded",
                row + 1,
                self.columns[col].len()
            ))
        })?;
        slot.fetch_add(value, Ordering::Relaxed);
        Ok(())
    }

    fn snapshot(&self, col: usize) -> Vec<usize> {
        self.columns[col].iter().map(|s| s.load(Ordering::Relaxed)).collect()
    }
}

/// Everything a worker needs that does not change between sequences.
struct ScanContext<'a> {
    table: &'a ReferenceTable,
    opt: &'a ScanOpt,
    columns: &'a [usize],
    labels: &'a [String],
    sums: Option<&'a MapnumSums>,
    progress: &'a dyn ProgressSink,
}

enum Outcome {
    Done,
    Failed(NucError),
    Cancelled,
}

fn create_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Create `<out>/<name>`, or `<out>/_<name>` when the plain name is refused.
/// On fallback the sequence is renamed to match its directory.
fn prepare_dir(out: &Path, seq: &mut TargetSequence) -> Result<PathBuf> {
    let dir = out.join(seq.name());
    if create_dir(&dir).is_ok() {
        return Ok(dir);
    }
    let fallback_name = format!("_{}", seq.name());
    let fallback = out.join(&fallback_name);
    create_dir(&fallback).at_path(&fallback)?;
    log::warn!("Writing results of {} to {}", seq.name(), fallback.display());
    seq.rename(fallback_name);
    Ok(fallback)
}

/// Scan every sequence against the table.
///
/// Validation problems of the run as a whole (no usable column, no sequence)
/// and failure to create the output folder are returned as errors. A
/// sequence whose directory or outputs fail is reported in
/// [`ScanReport::failures`] while the others proceed. `cancel` is checked
/// before each sequence starts.
pub fn search(
    table: &ReferenceTable,
    sequences: &mut [TargetSequence],
    opt: &ScanOpt,
    progress: &dyn ProgressSink,
    cancel: &AtomicBool,
) -> Result<ScanReport> {
    let columns = table.check_columns(&opt.columns);
    if columns.is_empty() {
        return Err(NucError::validation("No valid column selected."));
    }
    if sequences.is_empty() {
        return Err(NucError::validation("No sequence to scan."));
    }
    fs::create_dir_all(&opt.output_folder).at_path(&opt.output_folder)?;

    progress.status("Preparing...");
    let mut failures = Vec::new();
    let mut jobs: Vec<(&mut TargetSequence, PathBuf)> = Vec::with_capacity(sequences.len());
    for seq in sequences.iter_mut() {
        match prepare_dir(&opt.output_folder, seq) {
            Ok(dir) => jobs.push((seq, dir)),
            Err(e) => {
                log::warn!("Skipping {}: could not create its output folder ({})", seq.name(), e);
                failures.push((seq.name().to_string(), e));
            }
        }
    }

    let lengths: Vec<usize> = jobs.iter().map(|(seq, _)| seq.len()).collect();
    let inputs = CostInputs::from_lengths(table.row_count(), table.max_word_len(), opt.mismatches, &lengths);
    let strategy = opt.strategy.resolve(&inputs);
    log::info!(
        "Scanning {} sequence(s) against {} rows, {} column(s), {:?} search",
        jobs.len(),
        table.row_count(),
        columns.len(),
        strategy
    );
    log::debug!(
        "Estimated cost: indexed {:.3e}, naive {:.3e}",
        inputs.indexed_total(),
        inputs.naive_total()
    );

    let nseq = jobs.len();
    let labels: Vec<String> = columns.iter().map(|&c| opt.decorate(table.label(c))).collect();
    let sums = (opt.mapnum && nseq > 1).then(|| MapnumSums::new(columns.len(), table.row_count()));
    let ctx = ScanContext {
        table,
        opt,
        columns: &columns,
        labels: &labels,
        sums: sums.as_ref(),
        progress,
    };

    let threads = opt.threads.clamp(1, nseq.max(1));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| NucError::Unexpected(format!("Failed to build thread pool: {}", e)))?;
    log::debug!("Using {} worker thread(s)", threads);

    progress.status("Processing...");
    let outcomes: Vec<Outcome> = pool.install(|| {
        jobs.par_iter_mut()
            .map(|(seq, dir)| {
                if cancel.load(Ordering::Relaxed) {
                    return Outcome::Cancelled;
                }
                match scan_sequence(&ctx, &mut **seq, dir.as_path(), strategy) {
                    Ok(()) => Outcome::Done,
                    Err(e) => Outcome::Failed(e),
                }
            })
            .collect()
    });

    let mut processed = Vec::new();
    let mut cancelled = false;
    let mut done_jobs = Vec::new();
    for ((seq, dir), outcome) in jobs.into_iter().zip(outcomes) {
        match outcome {
            Outcome::Done => {
                processed.push(seq.name().to_string());
                done_jobs.push((seq, dir));
            }
            Outcome::Failed(e) => {
                log::warn!("Scan of {} failed: {}", seq.name(), e);
                failures.push((seq.name().to_string(), e));
            }
            Outcome::Cancelled => cancelled = true,
        }
    }

    if cancelled {
        log::warn!("Scan cancelled after {} of {} sequence(s)", processed.len(), nseq);
        progress.status("Cancelled.");
        return Ok(ScanReport {
            strategy,
            processed,
            failures,
            cancelled,
        });
    }

    if let Some(sums) = sums.as_ref() {
        progress.status("Aggregating...");
        for (i, &col) in columns.iter().enumerate() {
            let path = output::aggregate_path(&opt.output_folder, &labels[i], nseq);
            output::write_aggregate(path, table, col, &labels[i], &sums.snapshot(i), opt.absent)?;
        }
    }

    if opt.masked {
        for (seq, dir) in &done_jobs {
            for label in &labels {
                if let Err(e) = mask::write_masked(dir, &**seq, label) {
                    log::warn!("Masked output of {} failed: {}", seq.name(), e);
                    failures.push((seq.name().to_string(), e));
                }
            }
        }
    }

    progress.status("Done.");
    log::info!("Scanned {} sequence(s), {} failure(s)", processed.len(), failures.len());
    Ok(ScanReport {
        strategy,
        processed,
        failures,
        cancelled,
    })
}

/// Scan one sequence. The index, if any, is released before returning, on
/// the error path too.
fn scan_sequence(ctx: &ScanContext<'_>, seq: &mut TargetSequence, dir: &Path, strategy: Strategy) -> Result<()> {
    let name = seq.name().to_string();
    match strategy {
        Strategy::Indexed => {
            let indexed = seq.index()?;
            scan_rows(ctx, &indexed, &name, dir)
        }
        Strategy::Naive => scan_rows(ctx, &NaiveMatcher::new(seq.residues()), &name, dir),
    }
}

fn scan_rows(ctx: &ScanContext<'_>, matcher: &dyn Matcher, seq_name: &str, dir: &Path) -> Result<()> {
    let opt = ctx.opt;
    let table = ctx.table;
    let submatch = opt.submatch();
    let worker = rayon::current_thread_index().unwrap_or(0);

    let mut outputs = Vec::with_capacity(ctx.columns.len());
    for (i, &col) in ctx.columns.iter().enumerate() {
        let spec = ColumnSpec {
            label: &ctx.labels[i],
            column_label: table.label(col),
            has_mapnum_column: table.has_mapnum(),
            mapnum_mode: opt.mapnum,
            absent: opt.absent,
            submatch,
        };
        outputs.push(ColumnOutputs::create(dir, seq_name, &spec)?);
    }

    let mut pending = 0;
    for (l, row) in table.rows()?.enumerate() {
        let row = row?;
        let word = row.word();
        let name = table.row_name(&row);
        let mapnum = table.has_mapnum().then(|| row.field(table.mapnum_col()));

        for (i, &col) in ctx.columns.iter().enumerate() {
            let value = table.column_value(&row, col);
            if value == MASKED_VALUE {
                continue;
            }
            let mut sense = Query::new(name, &word, Strand::Sense);
            sense.search(matcher, opt.mismatches, opt.min_submatch);
            let mut antisense = Query::new(name, &word, Strand::Antisense);
            antisense.search(matcher, opt.mismatches, opt.min_submatch);

            let fields = RowFields {
                word: row.field(0),
                value,
                mapnum,
            };
            let lsum = outputs[i].record(&sense, &antisense, &fields)?;
            if let Some(sums) = ctx.sums {
                sums.add(i, l, lsum)?;
            }
        }

        pending += 1;
        if pending == PROGRESS_BATCH {
            ctx.progress.advance(worker, pending);
            pending = 0;
        }
    }
    ctx.progress.advance(worker, pending);

    for out in outputs {
        out.finish()?;
    }
    log::debug!("Finished {}", seq_name);
    Ok(())
}
