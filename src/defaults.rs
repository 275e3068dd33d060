// src/defaults.rs

// Index Constants
pub const OCC_BLOCK_SIZE: usize = 18;

// Search Constants
pub const MISMATCHES: usize = 0;
pub const MIN_SUBMATCH: usize = 0;
// Windows of 9 bases or fewer match almost everywhere
pub const SUBMATCH_ACTIVATION: usize = 10;

// Output Constants
pub const OUTPUT_FOLDER: &str = "./Results/";
pub const GFF_SOURCE: &str = "NucBase";
pub const GFF_FEATURE: &str = "piRNA";
pub const MASKED_LINE_WIDTH: usize = 80;

// Other Constants
pub const VERBOSITY: i32 = 3;
