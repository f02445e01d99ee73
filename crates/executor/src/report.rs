use std::io::{self, Write};
use tagname_core::{Config, FileOutcome};

pub(crate) const RULE_WIDTH: usize = 70;

/// Successes split by whether the sanitizer touched them, plus failures.
/// Each list keeps the input order.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub clean: Vec<&'a FileOutcome>,
    pub sanitized: Vec<&'a FileOutcome>,
    pub failed: Vec<&'a FileOutcome>,
}

impl<'a> Partition<'a> {
    pub fn new(outcomes: &'a [FileOutcome]) -> Self {
        let mut partition = Partition::default();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Success { .. } if outcome.was_sanitized() => {
                    partition.sanitized.push(outcome)
                }
                FileOutcome::Success { .. } => partition.clean.push(outcome),
                FileOutcome::Failure { .. } => partition.failed.push(outcome),
            }
        }
        partition
    }

    pub fn successes(&self) -> usize {
        self.clean.len() + self.sanitized.len()
    }
}

pub(crate) fn heading(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

/// Print what an execute run would do. Touches nothing on disk.
pub fn write_dry_run(
    config: &Config,
    outcomes: &[FileOutcome],
    out: &mut impl Write,
) -> io::Result<()> {
    let partition = Partition::new(outcomes);

    heading(out, "DRY RUN REPORT")?;
    writeln!(out, "  Source:  {}", config.source.display())?;
    writeln!(out, "  Output:  {}", config.output.display())?;
    writeln!(out, "  Failed:  {}", config.failed_dir().display())?;
    writeln!(out, "  Format:  {}", config.generator.primary())?;

    if !partition.clean.is_empty() {
        writeln!(out, "\n✓ CLEAN FILES ({}):", partition.clean.len())?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        for outcome in partition.clean.iter().take(config.preview_limit) {
            writeln!(out, "  {}", outcome.original_name())?;
            writeln!(out, "    → {}", outcome.new_filename().unwrap_or_default())?;
        }
        if partition.clean.len() > config.preview_limit {
            writeln!(
                out,
                "  ... and {} more clean files",
                partition.clean.len() - config.preview_limit
            )?;
        }
    }

    if !partition.sanitized.is_empty() {
        writeln!(out, "\n⚠ SANITIZED FILES ({}):", partition.sanitized.len())?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        for outcome in &partition.sanitized {
            let FileOutcome::Success {
                new_filename,
                sanitize_details,
                ..
            } = outcome
            else {
                continue;
            };
            writeln!(out, "  {}", outcome.original_name())?;
            for (field, change) in sanitize_details {
                writeln!(out, "    {}: \"{}\"", field, change.original)?;
                writeln!(out, "         → \"{}\"", change.sanitized)?;
            }
            writeln!(out, "    → {}", new_filename)?;
            writeln!(out)?;
        }
    }

    if !partition.failed.is_empty() {
        writeln!(out, "\n✗ FAILED FILES ({}):", partition.failed.len())?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        for outcome in &partition.failed {
            if let FileOutcome::Failure { reason, .. } = outcome {
                writeln!(out, "  {}", outcome.original_name())?;
                writeln!(out, "    Reason: {}", reason)?;
                writeln!(out)?;
            }
        }
    }

    heading(out, "SUMMARY")?;
    writeln!(out, "  Clean:     {}", partition.clean.len())?;
    writeln!(out, "  Sanitized: {}", partition.sanitized.len())?;
    writeln!(out, "  Failed:    {}", partition.failed.len())?;
    writeln!(
        out,
        "  Total:     {} success, {} failed",
        partition.successes(),
        partition.failed.len()
    )?;
    writeln!(out, "\nTo execute, run again without --dry-run.")?;
    writeln!(out)?;

    Ok(())
}
