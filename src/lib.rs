pub mod alphabet;
pub mod cost; // Indexed vs naive strategy estimate
pub mod defaults;
pub mod error;
pub mod expand; // Ambiguity-code expansion of the reference table
pub mod index; // Per-sequence suffix array / BWT / FM-index search
pub mod progress;
pub mod query; // Queries and sub-window merging
pub mod scan; // Orchestration and result files
pub mod sequence; // Target sequence loading and the transient index
pub mod table; // Reference table loading and streaming
pub mod utils;

pub use cost::{Strategy, StrategyChoice};
pub use error::{NucError, Result};
pub use scan::{ScanOpt, ScanReport, search};
pub use sequence::TargetSequence;
pub use table::ReferenceTable;
