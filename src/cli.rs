//! Command-line interface implementation for Sprout.
//! Provides argument parsing and help text formatting using clap.

use crate::config::ConfigOverrides;
use crate::ignore::IgnorePolicy;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments structure for Sprout.
#[derive(Parser, Debug)]
#[command(author, version, about = "Sprout: create a project from a starter template and run it", long_about = None)]
pub struct Args {
    /// Starter template to use (skips the selection prompt)
    #[arg(short, long, value_name = "ID")]
    pub template: Option<String>,

    /// Project name (skips the name prompt)
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Directory the project is created in [default: current directory]
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Configuration file [default: sprout.json, sprout.yml or sprout.yaml in DIR]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the starter templates
    #[arg(long, value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    /// How the generated project's .gitignore is produced
    #[arg(long, value_enum, value_name = "POLICY")]
    pub ignore_policy: Option<IgnorePolicy>,

    /// Canonical ignore file used by the root-canonical policy
    #[arg(long, value_name = "FILE")]
    pub canonical_ignore: Option<PathBuf>,

    /// Dependency install command
    #[arg(long, value_name = "COMMAND")]
    pub install_cmd: Option<String>,

    /// Dev-server start command
    #[arg(long, value_name = "COMMAND")]
    pub start_cmd: Option<String>,

    /// How long to wait for the dev server to announce its port
    #[arg(long, value_name = "MILLIS")]
    pub port_timeout_ms: Option<u64>,

    /// List available templates and exit
    #[arg(long)]
    pub list: bool,

    /// Generate the project only; do not install or start it
    #[arg(long)]
    pub no_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Configuration values given on the command line.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            templates_dir: self.templates_dir.clone(),
            ignore_policy: self.ignore_policy,
            canonical_ignore: self.canonical_ignore.clone(),
            install: self.install_cmd.clone(),
            start: self.start_cmd.clone(),
            port_timeout_ms: self.port_timeout_ms,
        }
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With clap's default error handling for argument errors
pub fn get_args() -> Args {
    Args::parse()
}
