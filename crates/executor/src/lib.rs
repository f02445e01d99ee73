// Dry-run reporting and non-destructive copy execution

pub mod collision;
pub mod report;

pub use collision::resolve_collision;
pub use report::{Partition, write_dry_run};

use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File, FileTimes};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tagname_core::{Config, FileOutcome, Result};
use tracing::{debug, warn};

/// A file that could not be copied. Recorded, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyError {
    pub source: PathBuf,
    pub message: String,
}

impl fmt::Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .source
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.source.to_string_lossy());
        write!(f, "Failed to copy {}: {}", name, self.message)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub copied_clean: usize,
    pub copied_sanitized: usize,
    pub copied_failed: usize,
    /// Destination paths that needed a numeric suffix.
    pub collisions: Vec<PathBuf>,
    pub errors: Vec<CopyError>,
}

impl ExecutionSummary {
    pub fn copied(&self) -> usize {
        self.copied_clean + self.copied_sanitized
    }
}

/// Applies classified outcomes to the output tree. The source tree is only
/// ever read.
pub struct Executor<'a> {
    config: &'a Config,
}

impl<'a> Executor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Dry-run or execute, depending on configuration. Returns a summary only
    /// when files were copied.
    pub fn run(
        &self,
        outcomes: &[FileOutcome],
        out: &mut impl Write,
    ) -> Result<Option<ExecutionSummary>> {
        if self.config.dry_run {
            self.dry_run(outcomes, out)?;
            Ok(None)
        } else {
            self.execute(outcomes, out).map(Some)
        }
    }

    pub fn dry_run(&self, outcomes: &[FileOutcome], out: &mut impl Write) -> Result<()> {
        write_dry_run(self.config, outcomes, out)?;
        Ok(())
    }

    /// Copy successes under their new names and failures into `_failed/`.
    ///
    /// Only creating the output root itself is fatal; per-file problems end
    /// up in [`ExecutionSummary::errors`].
    pub fn execute(
        &self,
        outcomes: &[FileOutcome],
        out: &mut impl Write,
    ) -> Result<ExecutionSummary> {
        let partition = Partition::new(outcomes);
        let output = &self.config.output;
        let failed_dir = self.config.failed_dir();
        let mut summary = ExecutionSummary::default();

        if !output.exists() {
            fs::create_dir_all(output)?;
            writeln!(out, "Created output directory: {}", output.display())?;
        }

        let failed_dir_ready = if !partition.failed.is_empty() && !failed_dir.exists() {
            match fs::create_dir_all(&failed_dir) {
                Ok(()) => {
                    writeln!(out, "Created failed directory: {}", failed_dir.display())?;
                    true
                }
                Err(e) => {
                    warn!(dir = %failed_dir.display(), error = %e, "cannot create failed directory");
                    false
                }
            }
        } else {
            true
        };

        writeln!(out, "\nCopying and renaming files...")?;
        for outcome in outcomes {
            let FileOutcome::Success {
                original_path,
                new_filename,
                ..
            } = outcome
            else {
                continue;
            };

            let dest = resolve_collision(output, OsStr::new(new_filename));
            if dest != output.join(new_filename) {
                writeln!(out, "  ⚠ Collision: {} → {}", new_filename, file_name(&dest))?;
                summary.collisions.push(dest.clone());
            }

            match copy_preserving_times(original_path, &dest) {
                Ok(()) if outcome.was_sanitized() => {
                    summary.copied_sanitized += 1;
                    writeln!(out, "  ⚠ {} → {}", outcome.original_name(), file_name(&dest))?;
                }
                Ok(()) => {
                    summary.copied_clean += 1;
                    writeln!(out, "  ✓ {} → {}", outcome.original_name(), file_name(&dest))?;
                }
                Err(e) => summary.errors.push(CopyError {
                    source: original_path.clone(),
                    message: e.to_string(),
                }),
            }
        }

        if !partition.failed.is_empty() {
            writeln!(out, "\nCopying failed files to {}/...", tagname_core::FAILED_DIR_NAME)?;
            for outcome in &partition.failed {
                let FileOutcome::Failure {
                    original_path,
                    reason,
                } = outcome
                else {
                    continue;
                };

                let result = if failed_dir_ready {
                    let name = original_path
                        .file_name()
                        .unwrap_or(original_path.as_os_str());
                    let dest = resolve_collision(&failed_dir, name);
                    copy_preserving_times(original_path, &dest)
                } else {
                    Err(io::Error::other(format!(
                        "{} could not be created",
                        failed_dir.display()
                    )))
                };

                match result {
                    Ok(()) => {
                        summary.copied_failed += 1;
                        writeln!(out, "  → {} ({})", outcome.original_name(), reason)?;
                    }
                    Err(e) => summary.errors.push(CopyError {
                        source: original_path.clone(),
                        message: e.to_string(),
                    }),
                }
            }
        }

        write_summary(&summary, out)?;
        Ok(summary)
    }
}

fn write_summary(summary: &ExecutionSummary, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    report::heading(out, "EXECUTION COMPLETE")?;
    writeln!(out, "  Copied & renamed: {}", summary.copied())?;
    writeln!(out, "    - Clean:        {}", summary.copied_clean)?;
    writeln!(out, "    - Sanitized:    {}", summary.copied_sanitized)?;
    writeln!(out, "  Copied to failed: {}", summary.copied_failed)?;
    writeln!(out, "\n  Original files were NOT modified.")?;

    if !summary.errors.is_empty() {
        writeln!(out, "\n  ERRORS ({}):", summary.errors.len())?;
        for error in &summary.errors {
            writeln!(out, "    - {}", error)?;
        }
    }
    writeln!(out)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Copy `src` to `dest` and carry over access/modification times.
///
/// The copy itself must succeed; failing to set the times is only logged.
pub fn copy_preserving_times(src: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(src, dest)?;
    debug!(src = %src.display(), dest = %dest.display(), "copied");

    if let Err(e) = copy_times(src, dest) {
        warn!(dest = %dest.display(), error = %e, "could not preserve timestamps");
    }
    Ok(())
}

fn copy_times(src: &Path, dest: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    let mut times = FileTimes::new();
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }

    // futimens only needs ownership; Windows needs a writable handle.
    #[cfg(unix)]
    let file = File::open(dest)?;
    #[cfg(not(unix))]
    let file = File::options().write(true).open(dest)?;

    file.set_times(times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::{Duration, SystemTime};
    use tagname_core::{FailureReason, Field, FieldChange};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        config: Config,
    }

    fn fixture(dry_run: bool) -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("music");
        fs::create_dir(&source).unwrap();
        let mut config = Config::new(&source, dir.path().join("out")).unwrap();
        config.dry_run = dry_run;
        Fixture {
            _dir: dir,
            source,
            config,
        }
    }

    fn source_file(fx: &Fixture, name: &str, content: &[u8]) -> PathBuf {
        let path = fx.source.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn success(path: PathBuf, new: &str) -> FileOutcome {
        FileOutcome::Success {
            original_path: path,
            new_filename: new.to_string(),
            sanitize_details: BTreeMap::new(),
        }
    }

    fn failure(path: PathBuf) -> FileOutcome {
        FileOutcome::Failure {
            original_path: path,
            reason: FailureReason::UnreadableMetadata,
        }
    }

    fn execute(fx: &Fixture, outcomes: &[FileOutcome]) -> (ExecutionSummary, String) {
        let mut buf = Vec::new();
        let summary = Executor::new(&fx.config).execute(outcomes, &mut buf).unwrap();
        (summary, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let fx = fixture(true);
        let a = source_file(&fx, "a.mp3", b"a");
        let b = source_file(&fx, "b.mp3", b"b");

        let mut buf = Vec::new();
        let summary = Executor::new(&fx.config)
            .run(&[success(a, "A.mp3"), failure(b)], &mut buf)
            .unwrap();

        assert!(summary.is_none());
        assert!(!fx.config.output.exists());
        assert!(String::from_utf8(buf).unwrap().contains("DRY RUN REPORT"));
    }

    #[test]
    fn test_execute_copies_under_new_name() {
        let fx = fixture(false);
        let a = source_file(&fx, "a.mp3", b"alpha");

        let (summary, text) = execute(&fx, &[success(a.clone(), "Song _ Band.mp3")]);

        assert_eq!(summary.copied_clean, 1);
        assert!(summary.errors.is_empty());
        assert_eq!(
            fs::read(fx.config.output.join("Song _ Band.mp3")).unwrap(),
            b"alpha"
        );
        assert_eq!(fs::read(&a).unwrap(), b"alpha");
        assert!(!fx.config.failed_dir().exists());
        assert!(text.contains("Created output directory"));
        assert!(text.contains("✓ a.mp3 → Song _ Band.mp3"));
    }

    #[test]
    fn test_collisions_are_numbered_in_order() {
        let fx = fixture(false);
        let outcomes: Vec<FileOutcome> = ["1.mp3", "2.mp3", "3.mp3"]
            .iter()
            .map(|name| success(source_file(&fx, name, name.as_bytes()), "X.mp3"))
            .collect();

        let (summary, text) = execute(&fx, &outcomes);

        let out = &fx.config.output;
        assert_eq!(fs::read(out.join("X.mp3")).unwrap(), b"1.mp3");
        assert_eq!(fs::read(out.join("X (1).mp3")).unwrap(), b"2.mp3");
        assert_eq!(fs::read(out.join("X (2).mp3")).unwrap(), b"3.mp3");
        assert_eq!(
            summary.collisions,
            vec![out.join("X (1).mp3"), out.join("X (2).mp3")]
        );
        assert!(text.contains("⚠ Collision: X.mp3 → X (1).mp3"));
    }

    #[test]
    fn test_failures_go_to_failed_dir_with_own_collisions() {
        let fx = fixture(false);
        let nested = fx.source.join("disc2");
        fs::create_dir(&nested).unwrap();
        let a = source_file(&fx, "track.mp3", b"one");
        let b = nested.join("track.mp3");
        fs::write(&b, b"two").unwrap();

        let (summary, text) = execute(&fx, &[failure(a), failure(b)]);

        let failed = fx.config.failed_dir();
        assert_eq!(summary.copied_failed, 2);
        assert_eq!(fs::read(failed.join("track.mp3")).unwrap(), b"one");
        assert_eq!(fs::read(failed.join("track (1).mp3")).unwrap(), b"two");
        assert!(text.contains("Created failed directory"));
        assert!(text.contains("→ track.mp3 (Could not read metadata)"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_files_keep_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let fx = fixture(false);
        let names = [OsStr::from_bytes(b"caf\xe9.mp3"), OsStr::from_bytes(b"caf\xe8.mp3")];
        let mut outcomes = Vec::new();
        for name in names {
            let path = fx.source.join(name);
            // Some filesystems refuse names that are not UTF-8.
            if fs::write(&path, name.as_bytes()).is_err() {
                return;
            }
            outcomes.push(failure(path));
        }

        let (summary, _) = execute(&fx, &outcomes);

        assert_eq!(summary.copied_failed, 2);
        assert!(summary.collisions.is_empty());
        let mut copied: Vec<_> = fs::read_dir(fx.config.failed_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        copied.sort();
        let mut expected: Vec<_> = names.iter().map(|n| n.to_os_string()).collect();
        expected.sort();
        assert_eq!(copied, expected);
        for name in names {
            assert_eq!(
                fs::read(fx.config.failed_dir().join(name)).unwrap(),
                name.as_bytes()
            );
        }
    }

    #[test]
    fn test_success_and_failed_trees_are_independent() {
        let fx = fixture(false);
        let a = source_file(&fx, "X.mp3", b"ok");
        let b = source_file(&fx, "bad.mp3", b"bad");
        fs::create_dir_all(fx.config.failed_dir()).unwrap();
        fs::write(fx.config.output.join("bad.mp3"), b"existing").unwrap();

        let (summary, _) = execute(&fx, &[success(a, "X.mp3"), failure(b)]);

        assert!(summary.collisions.is_empty());
        assert_eq!(fs::read(fx.config.failed_dir().join("bad.mp3")).unwrap(), b"bad");
    }

    #[test]
    fn test_copy_errors_do_not_abort() {
        let fx = fixture(false);
        let missing = fx.source.join("gone.mp3");
        let b = source_file(&fx, "b.mp3", b"b");

        let (summary, text) = execute(&fx, &[success(missing, "Gone.mp3"), success(b, "B.mp3")]);

        assert_eq!(summary.copied_clean, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].to_string().starts_with("Failed to copy gone.mp3"));
        assert!(fx.config.output.join("B.mp3").exists());
        assert!(text.contains("ERRORS (1):"));
    }

    #[test]
    fn test_sanitized_successes_are_counted_separately() {
        let fx = fixture(false);
        let a = source_file(&fx, "a.mp3", b"a");
        let mut details = BTreeMap::new();
        details.insert(
            Field::Artist,
            FieldChange {
                original: "AC/DC".to_string(),
                sanitized: "AC-DC".to_string(),
            },
        );
        let outcome = FileOutcome::Success {
            original_path: a,
            new_filename: "T.N.T _ AC-DC.mp3".to_string(),
            sanitize_details: details,
        };

        let (summary, text) = execute(&fx, &[outcome]);
        assert_eq!(summary.copied_sanitized, 1);
        assert_eq!(summary.copied(), 1);
        assert!(text.contains("⚠ a.mp3 → T.N.T _ AC-DC.mp3"));
    }

    #[test]
    fn test_modification_time_is_preserved() {
        let fx = fixture(false);
        let a = source_file(&fx, "a.mp3", b"a");
        let past = SystemTime::now() - Duration::from_secs(86_400 * 30);
        File::options()
            .write(true)
            .open(&a)
            .unwrap()
            .set_modified(past)
            .unwrap();

        execute(&fx, &[success(a.clone(), "A.mp3")]);

        let src_time = fs::metadata(&a).unwrap().modified().unwrap();
        let dest_time = fs::metadata(fx.config.output.join("A.mp3"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(src_time, dest_time);
    }
}
