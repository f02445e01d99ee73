use crate::error::{Error, Result};
use crate::sanitize::{Replacement, Sanitizer, default_replacements};
use crate::template::{FilenameGenerator, FilenameTemplate};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_FORMAT: &str = "{title} _ {artist}";
pub const DEFAULT_FORMAT_NO_TRACK: &str = "{title} _ {artist}";
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "m4a", "mp3", "flac", "ogg", "opus", "wma", "aac", "wav", "aiff",
];

/// Raw TOML configuration structure.
/// Every key is optional; missing keys fall back to the built-in defaults.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub dry_run: Option<bool>,
    pub preview_limit: Option<usize>,
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub format: FormatSection,
    /// Replaces the default table wholesale when present.
    pub replace: Option<Vec<Replacement>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatSection {
    pub primary: Option<String>,
    pub no_track: Option<String>,
}

/// Run configuration. Built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: PathBuf,
    pub output: PathBuf,
    pub dry_run: bool,
    pub preview_limit: usize,
    pub generator: FilenameGenerator,
    pub sanitizer: Sanitizer,
    /// Lowercase, without leading dot.
    pub extensions: BTreeSet<String>,
}

impl Config {
    /// Configuration with built-in defaults for the given roots.
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Result<Self> {
        ConfigFile::default().into_config(source, output)
    }

    pub fn failed_dir(&self) -> PathBuf {
        self.output.join(crate::types::FAILED_DIR_NAME)
    }

    /// Case-insensitive check; accepts the extension with or without a dot.
    pub fn is_supported(&self, extension: &str) -> bool {
        self.extensions
            .contains(&extension.trim_start_matches('.').to_lowercase())
    }

    /// The output root when it sits strictly inside the source tree, so the
    /// scanner can prune it.
    pub fn nested_output(&self) -> Option<&Path> {
        (self.output != self.source && self.output.starts_with(&self.source))
            .then_some(self.output.as_path())
    }
}

impl ConfigFile {
    /// Validate and resolve into a [`Config`]. Relative roots are resolved
    /// against the current directory.
    pub fn into_config(
        self,
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Result<Config> {
        let format = self.format;
        let primary = FilenameTemplate::parse(format.primary.as_deref().unwrap_or(DEFAULT_FORMAT))?;
        let no_track =
            FilenameTemplate::parse(format.no_track.as_deref().unwrap_or(DEFAULT_FORMAT_NO_TRACK))?;

        let sanitizer = Sanitizer::new(self.replace.unwrap_or_else(default_replacements))?;

        let extensions = match self.extensions {
            Some(list) => normalize_extensions(&list)?,
            None => DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        };

        let preview_limit = self.preview_limit.unwrap_or(DEFAULT_PREVIEW_LIMIT);

        Ok(Config {
            source: resolve_path(source.into())?,
            output: resolve_path(output.into())?,
            dry_run: self.dry_run.unwrap_or(false),
            preview_limit,
            generator: FilenameGenerator::new(primary, no_track),
            sanitizer,
            extensions,
        })
    }
}

/// Parse a config file from a path
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse a config file from a string (useful for testing)
pub fn parse_config_str(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

fn normalize_extensions(list: &[String]) -> Result<BTreeSet<String>> {
    if list.is_empty() {
        return Err(Error::Config(
            "'extensions' must list at least one extension".to_string(),
        ));
    }

    list.iter()
        .map(|raw| {
            let ext = raw.trim().trim_start_matches('.').to_lowercase();
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                Err(Error::Config(format!("Invalid extension '{}'", raw)))
            } else {
                Ok(ext)
            }
        })
        .collect()
}

fn resolve_path(path: PathBuf) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::Config("Empty path".to_string()));
    }
    Ok(std::path::absolute(path)?)
}
