use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tagname_core::config::{
    DEFAULT_EXTENSIONS, DEFAULT_FORMAT, DEFAULT_FORMAT_NO_TRACK, DEFAULT_PREVIEW_LIMIT,
};
use tagname_core::sanitize::default_replacements;

/// Escape a string for safe inclusion in a TOML basic string.
///
/// Written by hand rather than serialized because the generated file carries
/// comments, which the toml crate does not emit.
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// The built-in configuration as a commented TOML document.
pub fn default_config_toml() -> String {
    let extensions: Vec<String> = DEFAULT_EXTENSIONS
        .iter()
        .map(|e| format!("\"{}\"", toml_escape_string(e)))
        .collect();

    let mut toml = format!(
        r#"# tagname configuration
#
# Every key is optional. Command-line flags take precedence.

# Preview only; copy nothing
dry_run = false

# Clean files listed in the dry-run report
preview_limit = {preview_limit}

# Extensions picked up by the scan (case-insensitive)
# .wma files are picked up, but their tags cannot be read yet, so they are
# always copied to _failed/ unchanged.
extensions = [{extensions}]

# Placeholders: {{artist}}, {{album}}, {{track}}, {{title}}
# {{track}} is zero-padded to 2 digits. "no_track" is used when a file has no
# track number or "primary" does not reference {{track}}.
[format]
primary = "{primary}"
no_track = "{no_track}"

# Character replacements, applied in order before any remaining invalid
# characters (< > : " / \ | ? *) are stripped. Listing [[replace]] entries
# replaces this whole table.
"#,
        preview_limit = DEFAULT_PREVIEW_LIMIT,
        extensions = extensions.join(", "),
        primary = toml_escape_string(DEFAULT_FORMAT),
        no_track = toml_escape_string(DEFAULT_FORMAT_NO_TRACK),
    );

    for rule in default_replacements() {
        toml.push_str(&format!(
            "\n[[replace]]\nfrom = \"{}\"\nto = \"{}\"\n",
            toml_escape_string(&rule.from),
            toml_escape_string(&rule.to)
        ));
    }

    toml
}

/// Print the default configuration, or write it to `path`.
pub fn run(path: Option<PathBuf>) -> Result<()> {
    let content = default_config_toml();

    let Some(path) = path else {
        print!("{}", content);
        return Ok(());
    };

    if path.exists() {
        anyhow::bail!(
            "{} already exists\nHint: Delete it first or choose a different path",
            path.display()
        );
    }

    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✓ Wrote {}", path.display());
    Ok(())
}
