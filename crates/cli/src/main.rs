mod commands;

use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tagname")]
#[command(version, about = "Copy music files into a new tree, named from their tags", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Rename audio files by copying them into OUTPUT
    ///
    /// Originals are never modified. Files that cannot be renamed are copied
    /// unchanged into OUTPUT/_failed.
    Rename(commands::rename::RenameArgs),

    /// Write a default configuration file
    Config {
        /// Where to write it (prints to stdout when omitted)
        path: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,tagname=debug,tagname_core=debug,tagname_tags=debug,tagname_planner=debug,tagname_executor=debug",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Rename(args) => commands::rename::run(args),
        Command::Config { path } => commands::config::run(path),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "tagname", &mut io::stdout());
            Ok(())
        }
    }
}
