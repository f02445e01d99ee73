use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid filename template '{template}': {reason}")]
    Template { template: String, reason: String },

    #[error("Source directory '{}' does not exist", .0.display())]
    SourceNotFound(PathBuf),

    #[error("'{}' is not a directory", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
