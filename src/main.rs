use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use nucscan::defaults::{MIN_SUBMATCH, MISMATCHES, OUTPUT_FOLDER, VERBOSITY};
use nucscan::progress::ProgressCounters;
use nucscan::sequence::collect_sequences;
use nucscan::{ReferenceTable, ScanOpt, StrategyChoice};

#[derive(Parser)]
#[command(name = "nucscan")]
#[command(about = "NucScan - search a table of nucleotide words in target sequences", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every row of a reference table in the target sequences
    Search {
        /// Reference table (tab-separated, word in the first column)
        #[arg(value_name = "TABLE")]
        table: PathBuf,

        /// Sequence file (FASTA collection or single record) or folder
        #[arg(short = 's', long = "sequences", value_name = "PATH")]
        sequences: Vec<PathBuf>,

        /// Inline sequence given as NAME=SEQ
        #[arg(long, value_name = "NAME=SEQ")]
        inline: Vec<String>,

        // ===== Search Options =====
        /// Table column to scan (repeatable; default: every column)
        #[arg(short = 'c', long = "column", value_name = "INT")]
        columns: Vec<usize>,

        /// Number of mismatches allowed
        #[arg(short = 'm', long, value_name = "INT", default_value_t = MISMATCHES)]
        mismatches: usize,

        /// Minimum sub-window length for partial matches (active from 10)
        #[arg(short = 'b', long = "min-block", value_name = "INT", default_value_t = MIN_SUBMATCH)]
        min_submatch: usize,

        /// Search strategy
        #[arg(long, value_enum, default_value = "auto")]
        strategy: StrategyArg,

        // ===== Output Options =====
        /// Report rows without hits instead of rows with hits
        #[arg(long)]
        absent: bool,

        /// Write map numbers per sequence and across sequences
        #[arg(long)]
        mapnum: bool,

        /// Write sequences with matched bases masked by '*'
        #[arg(long)]
        masked: bool,

        /// Output folder
        #[arg(short = 'o', long, value_name = "DIR", default_value = OUTPUT_FOLDER)]
        output: PathBuf,

        // ===== Processing Options =====
        /// Number of threads (default: all available cores)
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,

        /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
        #[arg(short = 'v', long, value_name = "INT", default_value_t = VERBOSITY)]
        verbosity: i32,
    },

    /// List the selectable columns of a reference table
    Labels {
        #[arg(value_name = "TABLE")]
        table: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Auto,
    Indexed,
    Naive,
}

impl From<StrategyArg> for StrategyChoice {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => StrategyChoice::Auto,
            StrategyArg::Indexed => StrategyChoice::Indexed,
            StrategyArg::Naive => StrategyChoice::Naive,
        }
    }
}

fn init_logger(verbosity: i32) {
    // 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn resolve_threads(threads: Option<usize>) -> usize {
    let mut num_threads = threads.unwrap_or_else(num_cpus::get);
    if num_threads < 1 {
        log::warn!("Invalid thread count {}, using 1 thread", num_threads);
        num_threads = 1;
    }
    let max_threads = num_cpus::get() * 2;
    if num_threads > max_threads {
        log::warn!(
            "Thread count {} exceeds recommended maximum {}, capping at {}",
            num_threads,
            max_threads,
            max_threads
        );
        num_threads = max_threads;
    }
    num_threads
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Labels { table } => {
            let table = ReferenceTable::open(&table)
                .with_context(|| format!("Cannot load database {}", table.display()))?;
            for col in table.selectable_columns() {
                println!("{}\t{}", col, table.label(col));
            }
            Ok(())
        }

        Commands::Search {
            table,
            sequences,
            inline,
            columns,
            mismatches,
            min_submatch,
            strategy,
            absent,
            mapnum,
            masked,
            output,
            threads,
            verbosity: _,
        } => {
            if sequences.is_empty() && inline.is_empty() {
                bail!("No folder selected and no sequence provided.");
            }

            let table = ReferenceTable::open(&table)
                .with_context(|| format!("Cannot load database {}", table.display()))?;
            let mut targets =
                collect_sequences(&sequences, &inline).context("Cannot load the target sequences")?;

            let opt = ScanOpt {
                output_folder: output,
                columns,
                mismatches,
                min_submatch,
                absent,
                mapnum,
                masked,
                threads: resolve_threads(threads),
                strategy: strategy.into(),
            };
            log::info!("Search parameters:");
            log::info!("  Mismatches: {}", opt.mismatches);
            log::info!("  Min block: {}", opt.min_submatch);
            log::info!("  Threads: {}", opt.threads);

            let progress = ProgressCounters::new();
            let cancel = AtomicBool::new(false);
            let report = nucscan::search(&table, &mut targets, &opt, &progress, &cancel)?;

            for (name, err) in &report.failures {
                log::error!("{}: {} ({})", name, err, err.kind_label());
            }
            log::info!(
                "Processed {} sequence(s) with {:?} search, {} rows read",
                report.processed.len(),
                report.strategy,
                progress.total()
            );
            if !report.is_success() {
                bail!("{} sequence(s) could not be processed", report.failures.len());
            }
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let verbosity = match &cli.command {
        Commands::Search { verbosity, .. } => *verbosity,
        Commands::Labels { .. } => VERBOSITY,
    };
    init_logger(verbosity);

    if let Err(e) = run(cli.command) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
