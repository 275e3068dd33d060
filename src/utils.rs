use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

#[path = "utils_test.rs"]
mod utils_test;

const READ_BUFFER_SIZE: usize = 1 << 20;

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("gz")
}

/// Open a file for buffered reading, decompressing `.gz` files on the fly.
pub fn xzopen(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
    }
}

/// File name without directory, `.gz` suffix and last extension.
///
/// `chr2L.fa.gz` gives `chr2L`.
pub fn stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let name = if is_gzip(path) { name.strip_suffix(".gz")? } else { name };
    let stem = match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    };
    if stem.is_empty() { None } else { Some(stem.to_string()) }
}

/// Whether a directory entry looks like a sequence file.
pub fn is_sequence_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("txt") | Some("fa") | Some("fasta")
    )
}
