use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Compile DTCG design tokens into platform artifacts.
#[derive(Debug, Parser)]
#[command(
    name = "tincture",
    version,
    about = "Compile DTCG design tokens into CSS, JSON, JS, Tailwind, Swift, and Kotlin artifacts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Color output: auto, always, never.
    #[arg(long, global = true, default_value = "auto", value_name = "WHEN")]
    pub color: String,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build all configured outputs.
    Build {
        /// Config file [default: ./tincture.config.{json,toml}].
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Override the configured build directory.
        #[arg(long, value_name = "DIR")]
        build_path: Option<PathBuf>,

        /// Print the output plan without writing files.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run lint rules over the resolved tokens.
    Lint {
        /// Config file [default: ./tincture.config.{json,toml}].
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Fail (exit 2) when warnings exceed this count.
        #[arg(long, value_name = "N")]
        max_warnings: Option<usize>,
    },

    /// Validate the configuration and all token documents.
    Validate {
        /// Config file [default: ./tincture.config.{json,toml}].
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Validate flag combinations, returning errors for conflicts.
    pub fn validate(&self) -> Result<(), crate::error::TinctureError> {
        if self.quiet && self.verbose > 0 {
            return Err(crate::error::TinctureError::Configuration {
                message: "cannot combine --quiet and --verbose".to_string(),
            });
        }
        Ok(())
    }
}
