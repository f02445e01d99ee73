// Scanning and per-file classification

pub mod pipeline;
pub mod scanner;

pub use pipeline::Pipeline;
pub use scanner::{scan, scan_dir};

use tagname_core::{Config, FileOutcome, Result};
use tagname_tags::TagReader;

/// Scan the configured source root and classify every file found, in scan
/// order. There is exactly one outcome per scanned file.
pub fn plan<R: TagReader + ?Sized>(config: &Config, reader: &R) -> Result<Vec<FileOutcome>> {
    let files = scan(config)?;
    Ok(Pipeline::new(config, reader).classify_all(&files))
}
