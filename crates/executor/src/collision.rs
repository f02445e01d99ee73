use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// First free path for `candidate` inside `dir`.
///
/// Returns `dir/candidate` when nothing is there, otherwise probes
/// `stem (1).ext`, `stem (2).ext`, ... Only checks for existence; nothing is
/// created. A dangling symlink counts as taken. Names are handled as
/// `OsStr`, so bytes that are not UTF-8 survive untouched.
pub fn resolve_collision(dir: &Path, candidate: &OsStr) -> PathBuf {
    let first = dir.join(candidate);
    if !is_taken(&first) {
        return first;
    }

    let name = Path::new(candidate);
    let stem = name.file_stem().unwrap_or(candidate);
    let ext = name.extension();

    let mut counter: u64 = 1;
    loop {
        let mut numbered = OsString::from(stem);
        numbered.push(format!(" ({})", counter));
        if let Some(ext) = ext {
            numbered.push(".");
            numbered.push(ext);
        }

        let path = dir.join(numbered);
        if !is_taken(&path) {
            return path;
        }
        counter += 1;
    }
}

fn is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
