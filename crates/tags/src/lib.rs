//! Read-only tag extraction using `lofty`.
//!
//! Container families name their tags differently (MP4 `ilst` atoms versus
//! key/value comments and frames). Each family gets a [`TagReader`]
//! implementation and [`Extractor`] picks one by file extension.

use lofty::config::ParseOptions;
use lofty::error::LoftyError;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::mp4::{AtomData, AtomIdent, Ilst, Mp4File};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use std::fs::File;
use std::path::Path;
use tagname_core::TagRecord;
use tracing::debug;

/// Extensions read through the MP4 atom reader.
pub const MP4_EXTENSIONS: &[&str] = &["m4a", "mp4", "m4b"];

const ATOM_ARTIST: [u8; 4] = *b"\xa9ART";
const ATOM_ALBUM: [u8; 4] = *b"\xa9alb";
const ATOM_TITLE: [u8; 4] = *b"\xa9nam";

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("{0}")]
    Lofty(#[from] LoftyError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("No tags found in file")]
    NoTags,
}

/// Reads artist/album/title/track from one container family.
pub trait TagReader {
    fn read(&self, path: &Path) -> Result<TagRecord, TagError>;

    /// Like [`TagReader::read`], but any failure becomes `None`.
    fn extract(&self, path: &Path) -> Option<TagRecord> {
        match self.read(path) {
            Ok(tags) => Some(tags),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "metadata unreadable");
                None
            }
        }
    }
}

/// MP4/M4A files: `©ART`, `©alb`, `©nam` and `trkn` atoms.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mp4Reader;

impl TagReader for Mp4Reader {
    fn read(&self, path: &Path) -> Result<TagRecord, TagError> {
        let mut file = File::open(path)?;
        let mp4 = Mp4File::read_from(&mut file, ParseOptions::new())?;
        let ilst = mp4.ilst().ok_or(TagError::NoTags)?;
        Ok(record_from_ilst(ilst))
    }
}

fn record_from_ilst(ilst: &Ilst) -> TagRecord {
    TagRecord::new(
        atom_text(ilst, ATOM_ARTIST),
        atom_text(ilst, ATOM_ALBUM),
        atom_text(ilst, ATOM_TITLE),
        ilst.track().map(|n| n.to_string()),
    )
}

fn atom_text(ilst: &Ilst, fourcc: [u8; 4]) -> Option<String> {
    ilst.get(&AtomIdent::Fourcc(fourcc))?
        .data()
        .find_map(|data| match data {
            AtomData::UTF8(text) => Some(text.clone()),
            _ => None,
        })
}

/// ID3, Vorbis comments, APE, RIFF INFO and friends, through lofty's
/// generic tag. Uses the primary tag, falling back to the first one present.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyValueReader;

impl TagReader for KeyValueReader {
    fn read(&self, path: &Path) -> Result<TagRecord, TagError> {
        let tagged_file = Probe::open(path)?.read()?;
        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .ok_or(TagError::NoTags)?;

        Ok(TagRecord::new(
            tag.artist().map(|s| s.into_owned()),
            tag.album().map(|s| s.into_owned()),
            tag.title().map(|s| s.into_owned()),
            raw_track(tag),
        ))
    }
}

/// The track value as stored, so "3/12" survives to be split by
/// [`TagRecord::new`]. Falls back to lofty's parsed number.
fn raw_track(tag: &Tag) -> Option<String> {
    tag.items()
        .find(|item| item.key() == &ItemKey::TrackNumber)
        .and_then(|item| item.value().text())
        .map(str::to_string)
        .or_else(|| tag.track().map(|n| n.to_string()))
}

/// Chooses a [`TagReader`] by lowercase file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct Extractor {
    mp4: Mp4Reader,
    key_value: KeyValueReader,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reader_for(&self, path: &Path) -> &dyn TagReader {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if MP4_EXTENSIONS.contains(&ext.as_str()) {
            &self.mp4
        } else {
            &self.key_value
        }
    }
}

impl TagReader for Extractor {
    fn read(&self, path: &Path) -> Result<TagRecord, TagError> {
        self.reader_for(path).read(path)
    }
}
