use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tagname_core::{Config, FailureReason, Field, FieldChange, FileOutcome, TagRecord};
use tagname_tags::TagReader;
use tracing::debug;

/// Classifies one file at a time: extension check, tag extraction, required
/// field check, sanitizing, filename generation. Holds no per-file state.
pub struct Pipeline<'a, R: TagReader + ?Sized> {
    config: &'a Config,
    reader: &'a R,
    required: BTreeSet<Field>,
}

impl<'a, R: TagReader + ?Sized> Pipeline<'a, R> {
    pub fn new(config: &'a Config, reader: &'a R) -> Self {
        Self {
            config,
            reader,
            required: config.generator.required_fields(),
        }
    }

    pub fn required_fields(&self) -> &BTreeSet<Field> {
        &self.required
    }

    /// Outcomes in the same order as `paths`.
    pub fn classify_all(&self, paths: &[PathBuf]) -> Vec<FileOutcome> {
        paths.iter().map(|p| self.classify(p)).collect()
    }

    pub fn classify(&self, path: &Path) -> FileOutcome {
        let outcome = self.classify_inner(path);
        match &outcome {
            FileOutcome::Success { new_filename, .. } => {
                debug!(path = %path.display(), new_filename = %new_filename, "classified");
            }
            FileOutcome::Failure { reason, .. } => {
                debug!(path = %path.display(), reason = %reason, "classification failed");
            }
        }
        outcome
    }

    fn classify_inner(&self, path: &Path) -> FileOutcome {
        let failure = |reason| FileOutcome::Failure {
            original_path: path.to_path_buf(),
            reason,
        };

        let extension = match path.extension() {
            Some(ext) if self.config.is_supported(&ext.to_string_lossy()) => {
                ext.to_string_lossy().to_lowercase()
            }
            _ => return failure(FailureReason::UnsupportedFormat),
        };

        let Some(tags) = self.reader.extract(path) else {
            return failure(FailureReason::UnreadableMetadata);
        };

        let missing = tags.missing(&self.required);
        if !missing.is_empty() {
            return failure(FailureReason::MissingFields(missing));
        }

        let mut sanitized = TagRecord {
            track_number: tags.track_number.clone(),
            ..TagRecord::default()
        };
        let mut sanitize_details = BTreeMap::new();
        let mut emptied = Vec::new();

        for field in Field::TEXT {
            let Some(original) = tags.get(field) else {
                continue;
            };
            let out = self.config.sanitizer.sanitize(original);

            if out.text.is_empty() && self.required.contains(&field) {
                emptied.push(field);
            }
            if out.changed {
                sanitize_details.insert(
                    field,
                    FieldChange {
                        original: original.to_string(),
                        sanitized: out.text.clone(),
                    },
                );
            }
            sanitized.set(field, Some(out.text));
        }

        if !emptied.is_empty() {
            return failure(FailureReason::MissingFields(emptied));
        }

        FileOutcome::Success {
            original_path: path.to_path_buf(),
            new_filename: self.config.generator.generate(&sanitized, &extension),
            sanitize_details,
        }
    }
}
