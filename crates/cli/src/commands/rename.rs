use anyhow::{Context, Result};
use clap::Args;
use std::io::{self, Write};
use std::path::PathBuf;
use tagname_core::{Config, ConfigFile, parse_config_file};
use tagname_executor::Executor;
use tagname_planner::plan;
use tagname_tags::Extractor;
use tracing::info;

#[derive(Args, Debug, Default)]
pub struct RenameArgs {
    /// Folder to read music files from
    pub source: PathBuf,

    /// Folder to copy renamed files into
    pub output: PathBuf,

    /// Preview only; copy nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Filename template used when a track number is present
    #[arg(short, long, value_name = "TEMPLATE")]
    pub format: Option<String>,

    /// Filename template used when there is no track number
    #[arg(long, value_name = "TEMPLATE")]
    pub format_no_track: Option<String>,

    /// Number of clean files listed in the dry-run report
    #[arg(long, value_name = "N")]
    pub preview_limit: Option<usize>,
}

impl RenameArgs {
    /// Merge the config file (if any) with command-line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut file = match &self.config {
            Some(path) => parse_config_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ConfigFile::default(),
        };

        if self.dry_run {
            file.dry_run = Some(true);
        }
        if let Some(format) = &self.format {
            file.format.primary = Some(format.clone());
        }
        if let Some(format) = &self.format_no_track {
            file.format.no_track = Some(format.clone());
        }
        if let Some(limit) = self.preview_limit {
            file.preview_limit = Some(limit);
        }

        file.into_config(&self.source, &self.output)
            .context("Invalid configuration")
    }
}

/// Scan, classify, then report or copy.
///
/// A missing or non-directory source aborts before the output tree is
/// touched. Per-file problems never abort.
pub fn run(args: RenameArgs) -> Result<()> {
    let config = args.load_config()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "\nMusic File Renamer (Auto-Sanitize)")?;
    writeln!(out, "Source: {}", config.source.display())?;
    writeln!(out, "Output: {}", config.output.display())?;
    writeln!(
        out,
        "Mode:   {}",
        if config.dry_run { "DRY RUN" } else { "EXECUTE" }
    )?;
    writeln!(out, "Format: {}", config.generator.primary())?;

    let extractor = Extractor::new();
    let outcomes = plan(&config, &extractor).context("Cannot scan source directory")?;
    writeln!(
        out,
        "\nFound {} audio file(s) in '{}'\n",
        outcomes.len(),
        config.source.display()
    )?;

    if outcomes.is_empty() {
        writeln!(out, "\nNo audio files found.")?;
        return Ok(());
    }

    let summary = Executor::new(&config)
        .run(&outcomes, &mut out)
        .context("Failed to write output")?;

    if let Some(summary) = summary {
        info!(
            copied = summary.copied(),
            failed = summary.copied_failed,
            errors = summary.errors.len(),
            "run complete"
        );
    }

    Ok(())
}
