use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the subfolder (under the output root) that receives files which
/// could not be renamed.
pub const FAILED_DIR_NAME: &str = "_failed";

/// A metadata field a filename template can reference.
///
/// Declaration order is the canonical reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Artist,
    Album,
    Title,
    Track,
}

impl Field {
    /// Fields that go through the sanitizer.
    pub const TEXT: [Field; 3] = [Field::Artist, Field::Album, Field::Title];

    pub fn name(self) -> &'static str {
        match self {
            Field::Artist => "artist",
            Field::Album => "album",
            Field::Title => "title",
            Field::Track => "track",
        }
    }

    pub fn from_placeholder(name: &str) -> Option<Field> {
        match name {
            "artist" => Some(Field::Artist),
            "album" => Some(Field::Album),
            "title" => Some(Field::Title),
            "track" => Some(Field::Track),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tags read from a single audio file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRecord {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    /// Numerator only; "3/12" is stored as "3".
    pub track_number: Option<String>,
}

impl TagRecord {
    /// Build a record, dropping blank values and keeping only the numerator
    /// of an "N/M" track value.
    pub fn new(
        artist: Option<String>,
        album: Option<String>,
        title: Option<String>,
        track_number: Option<String>,
    ) -> Self {
        Self {
            artist: non_blank(artist),
            album: non_blank(album),
            title: non_blank(title),
            track_number: non_blank(track_number.map(|t| track_numerator(&t).to_string())),
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Artist => self.artist.as_deref(),
            Field::Album => self.album.as_deref(),
            Field::Title => self.title.as_deref(),
            Field::Track => self.track_number.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        match field {
            Field::Artist => self.artist = value,
            Field::Album => self.album = value,
            Field::Title => self.title = value,
            Field::Track => self.track_number = value,
        }
    }

    /// Fields from `required` that have no value, in canonical order.
    pub fn missing<'a>(&self, required: impl IntoIterator<Item = &'a Field>) -> Vec<Field> {
        let mut missing: Vec<Field> = required
            .into_iter()
            .copied()
            .filter(|f| self.get(*f).is_none())
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

/// Keep the part of a "N/M" track value before the slash.
pub fn track_numerator(raw: &str) -> &str {
    raw.split('/').next().unwrap_or(raw).trim()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Before/after pair for a field the sanitizer rewrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub original: String,
    pub sanitized: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    UnsupportedFormat,
    UnreadableMetadata,
    MissingFields(Vec<Field>),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::UnsupportedFormat => f.write_str("Unsupported format"),
            FailureReason::UnreadableMetadata => f.write_str("Could not read metadata"),
            FailureReason::MissingFields(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
                write!(f, "Missing metadata: {}", names.join(", "))
            }
        }
    }
}

/// Result of classifying one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Success {
        original_path: PathBuf,
        new_filename: String,
        sanitize_details: BTreeMap<Field, FieldChange>,
    },
    Failure {
        original_path: PathBuf,
        reason: FailureReason,
    },
}

impl FileOutcome {
    pub fn original_path(&self) -> &Path {
        match self {
            FileOutcome::Success { original_path, .. } => original_path,
            FileOutcome::Failure { original_path, .. } => original_path,
        }
    }

    /// File name of the source, for reports.
    pub fn original_name(&self) -> String {
        self.original_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.original_path().display().to_string())
    }

    pub fn new_filename(&self) -> Option<&str> {
        match self {
            FileOutcome::Success { new_filename, .. } => Some(new_filename),
            FileOutcome::Failure { .. } => None,
        }
    }

    /// True when at least one field was rewritten by the sanitizer.
    pub fn was_sanitized(&self) -> bool {
        match self {
            FileOutcome::Success {
                sanitize_details, ..
            } => !sanitize_details.is_empty(),
            FileOutcome::Failure { .. } => false,
        }
    }
}
