pub mod config;
pub mod error;
pub mod sanitize;
pub mod template;
pub mod types;

pub use config::{Config, ConfigFile, FormatSection, parse_config_file, parse_config_str};
pub use error::{Error, Result};
pub use sanitize::{Replacement, SanitizeOutcome, Sanitizer};
pub use template::{FilenameGenerator, FilenameTemplate};
pub use types::*;
