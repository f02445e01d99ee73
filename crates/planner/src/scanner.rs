use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tagname_core::{Config, Error, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Scan the configured source root, pruning the output root when it is
/// nested inside it.
pub fn scan(config: &Config) -> Result<Vec<PathBuf>> {
    scan_dir(
        &config.source,
        |ext| config.is_supported(ext),
        config.nested_output(),
    )
}

/// Recursively collect files under `root` whose extension passes
/// `is_supported`.
///
/// Fails only when `root` is missing or not a directory. Entries that cannot
/// be read are logged and skipped. The result is deduplicated and sorted by
/// path so repeated runs see the same order.
pub fn scan_dir(
    root: &Path,
    is_supported: impl Fn(&str) -> bool,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::SourceNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(Error::SourceNotDirectory(root.to_path_buf()));
    }

    let mut files = BTreeSet::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| exclude.is_none_or(|skip| e.path() != skip));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        // Symlinked files count, symlinked directories are not descended.
        if !entry.path().is_file() {
            continue;
        }

        if let Some(ext) = entry.path().extension()
            && is_supported(&ext.to_string_lossy())
        {
            files.insert(entry.into_path());
        }
    }

    debug!(root = %root.display(), count = files.len(), "scan complete");
    Ok(files.into_iter().collect())
}
