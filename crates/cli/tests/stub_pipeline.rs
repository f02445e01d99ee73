//! Drives scan, classify and execute through the library crates with tags
//! served from memory, so the scenarios do not depend on real audio files.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tagname_core::{
    Config, ConfigFile, FailureReason, Field, FileOutcome, FormatSection, TagRecord,
};
use tagname_executor::Executor;
use tagname_planner::plan;
use tagname_tags::{TagError, TagReader};
use tempfile::TempDir;

#[derive(Default)]
struct StubReader {
    files: HashMap<PathBuf, TagRecord>,
}

impl StubReader {
    fn tag(&mut self, path: &Path, artist: &str, title: &str, track: Option<&str>) {
        self.files.insert(
            path.to_path_buf(),
            TagRecord::new(
                Some(artist.to_string()),
                None,
                Some(title.to_string()),
                track.map(str::to_string),
            ),
        );
    }
}

impl TagReader for StubReader {
    fn read(&self, path: &Path) -> Result<TagRecord, TagError> {
        self.files.get(path).cloned().ok_or(TagError::NoTags)
    }
}

struct Library {
    _dir: TempDir,
    source: PathBuf,
    output: PathBuf,
}

fn library() -> Library {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("music");
    let output = dir.path().join("out");
    fs::create_dir(&source).unwrap();
    Library {
        _dir: dir,
        source,
        output,
    }
}

fn config(lib: &Library, dry_run: bool) -> Config {
    ConfigFile {
        dry_run: Some(dry_run),
        format: FormatSection {
            primary: Some("{track} {title} _ {artist}".to_string()),
            no_track: None,
        },
        ..Default::default()
    }
    .into_config(&lib.source, &lib.output)
    .unwrap()
}

fn write(path: &Path, content: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    path.to_path_buf()
}

fn digests(paths: &[PathBuf]) -> BTreeMap<PathBuf, Vec<u8>> {
    paths
        .iter()
        .map(|p| (p.clone(), Sha256::digest(fs::read(p).unwrap()).to_vec()))
        .collect()
}

#[test]
fn ac_dc_is_sanitized_and_copied() {
    let lib = library();
    let song = write(&lib.source.join("tnt.mp3"), b"tnt");
    let mut reader = StubReader::default();
    reader.tag(&song, "AC/DC", "T.N.T", Some("3/8"));

    let config = config(&lib, false);
    let outcomes = plan(&config, &reader).unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].new_filename(), Some("03 T.N.T _ AC-DC.mp3"));
    assert!(outcomes[0].was_sanitized());
    let FileOutcome::Success {
        sanitize_details, ..
    } = &outcomes[0]
    else {
        panic!("expected success");
    };
    assert_eq!(sanitize_details[&Field::Artist].sanitized, "AC-DC");
    assert!(!sanitize_details.contains_key(&Field::Title));

    let before = digests(&[song.clone()]);
    let summary = Executor::new(&config)
        .execute(&outcomes, &mut Vec::<u8>::new())
        .unwrap();

    assert_eq!(summary.copied_sanitized, 1);
    assert_eq!(
        fs::read(lib.output.join("03 T.N.T _ AC-DC.mp3")).unwrap(),
        b"tnt"
    );
    assert_eq!(digests(&[song]), before);
}

#[test]
fn unreadable_and_incomplete_files_land_in_failed() {
    let lib = library();
    let good = write(&lib.source.join("good.flac"), b"good");
    let untagged = write(&lib.source.join("untagged.mp3"), b"untagged");
    let partial = write(&lib.source.join("sub").join("partial.ogg"), b"partial");
    write(&lib.source.join("cover.jpg"), b"jpeg");

    let mut reader = StubReader::default();
    reader.tag(&good, "Band", "Song", None);
    reader.tag(&partial, "Band", "", Some("1"));

    let config = config(&lib, false);
    let outcomes = plan(&config, &reader).unwrap();

    let reasons: Vec<Option<&FailureReason>> = outcomes
        .iter()
        .map(|o| match o {
            FileOutcome::Failure { reason, .. } => Some(reason),
            FileOutcome::Success { .. } => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            None,
            Some(&FailureReason::MissingFields(vec![Field::Title])),
            Some(&FailureReason::UnreadableMetadata),
        ]
    );

    let summary = Executor::new(&config)
        .execute(&outcomes, &mut Vec::<u8>::new())
        .unwrap();

    assert_eq!(summary.copied_clean, 1);
    assert_eq!(summary.copied_failed, 2);
    assert!(summary.errors.is_empty());
    assert!(lib.output.join("Song _ Band.flac").exists());
    assert_eq!(
        fs::read(config.failed_dir().join("untagged.mp3")).unwrap(),
        b"untagged"
    );
    assert!(config.failed_dir().join("partial.ogg").exists());
    assert!(!lib.output.join("cover.jpg").exists());
}

#[test]
fn dry_run_report_lists_every_category() {
    let lib = library();
    let clean = write(&lib.source.join("a.mp3"), b"a");
    let dirty = write(&lib.source.join("b.mp3"), b"b");
    write(&lib.source.join("c.mp3"), b"c");

    let mut reader = StubReader::default();
    reader.tag(&clean, "Band", "Song", Some("1"));
    reader.tag(&dirty, "Who?", "What: Now", Some("2"));

    let config = config(&lib, true);
    let outcomes = plan(&config, &reader).unwrap();

    let mut buf = Vec::new();
    let summary = Executor::new(&config).run(&outcomes, &mut buf).unwrap();
    let report = String::from_utf8(buf).unwrap();

    assert!(summary.is_none());
    assert!(!lib.output.exists());
    assert!(report.contains("✓ CLEAN FILES (1):"));
    assert!(report.contains("→ 01 Song _ Band.mp3"));
    assert!(report.contains("⚠ SANITIZED FILES (1):"));
    assert!(report.contains("→ 02 What- Now _ Who.mp3"));
    assert!(report.contains("✗ FAILED FILES (1):"));
    assert!(report.contains("Reason: Could not read metadata"));
}
