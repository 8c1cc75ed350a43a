//! Engine configuration for Sprout.
//! Loads `sprout.json`/`sprout.yml`/`sprout.yaml`, applies command-line overrides
//! and resolves everything into a [`Config`] fixed for the lifetime of one run.

use crate::constants::{
    CONFIG_FILES, DEFAULT_INSTALL_COMMAND, DEFAULT_PORT, DEFAULT_PORT_TIMEOUT_MS,
    DEFAULT_START_COMMAND, DEFAULT_TEMPLATES_DIR, GITIGNORE,
};
use crate::error::{Error, Result};
use crate::ignore::IgnorePolicy;
use log::debug;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A command line to run in the generated project, stored as argv.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct CommandSpec {
    argv: Vec<String>,
}

impl CommandSpec {
    /// Splits a command line on whitespace. No shell quoting is interpreted.
    pub fn from_command_line(line: &str) -> Result<Self> {
        Self::try_from(line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

impl TryFrom<Vec<String>> for CommandSpec {
    type Error = Error;

    fn try_from(argv: Vec<String>) -> Result<Self> {
        if argv.is_empty() || argv[0].trim().is_empty() {
            return Err(Error::ConfigError("command must not be empty".to_string()));
        }
        Ok(Self { argv })
    }
}

impl<const N: usize> From<[&str; N]> for CommandSpec {
    fn from(argv: [&str; N]) -> Self {
        Self { argv: argv.iter().map(|s| s.to_string()).collect() }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Configuration as written in a `sprout.*` file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub templates_dir: Option<PathBuf>,
    pub ignore_policy: Option<IgnorePolicy>,
    pub canonical_ignore: Option<PathBuf>,
    pub install: Option<CommandSpec>,
    pub start: Option<CommandSpec>,
    pub port_timeout_ms: Option<u64>,
    pub default_port: Option<u16>,
    pub fail_on_stderr: Option<bool>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Values supplied on the command line; they win over the configuration file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub templates_dir: Option<PathBuf>,
    pub ignore_policy: Option<IgnorePolicy>,
    pub canonical_ignore: Option<PathBuf>,
    pub install: Option<String>,
    pub start: Option<String>,
    pub port_timeout_ms: Option<u64>,
}

/// Fully resolved engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub templates_dir: PathBuf,
    pub ignore_policy: IgnorePolicy,
    pub canonical_ignore: PathBuf,
    pub install: CommandSpec,
    pub start: CommandSpec,
    pub port_timeout: Duration,
    pub default_port: u16,
    pub fail_on_stderr: bool,
    pub exclude: Vec<String>,
}

impl Config {
    /// Builds a configuration with defaults for everything but the ignore policy,
    /// which has no default and must always be chosen explicitly.
    pub fn new<P: AsRef<Path>>(base_dir: P, ignore_policy: IgnorePolicy) -> Self {
        let base_dir = base_dir.as_ref();
        Self {
            templates_dir: base_dir.join(DEFAULT_TEMPLATES_DIR),
            ignore_policy,
            canonical_ignore: base_dir.join(GITIGNORE),
            install: DEFAULT_INSTALL_COMMAND.into(),
            start: DEFAULT_START_COMMAND.into(),
            port_timeout: Duration::from_millis(DEFAULT_PORT_TIMEOUT_MS),
            default_port: DEFAULT_PORT,
            fail_on_stderr: true,
            exclude: Vec::new(),
        }
    }
}

/// Returns the first configuration file found in `dir`.
pub fn find_config_file<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
    CONFIG_FILES.iter().map(|file| dir.as_ref().join(file)).find(|path| path.is_file())
}

/// Parses configuration content, trying JSON first and YAML second.
pub fn parse_config(content: &str) -> Result<ConfigFile> {
    match serde_json::from_str(content) {
        Ok(config) => Ok(config),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {}", e))),
    }
}

fn resolve_against(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Reads the explicit configuration file, or the first one found in `working_dir`.
/// Returns the parsed file and the directory its relative paths resolve against.
fn read_config_file(
    working_dir: &Path,
    config_path: Option<&Path>,
) -> Result<(ConfigFile, PathBuf)> {
    let config_path = match config_path {
        Some(path) => Some(resolve_against(working_dir, path.to_path_buf())),
        None => find_config_file(working_dir),
    };

    match config_path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(&path).map_err(Error::at_path(&path))?;
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| working_dir.into());
            Ok((parse_config(&content)?, dir))
        }
        None => {
            debug!("No configuration file found (tried: {})", CONFIG_FILES.join(", "));
            Ok((ConfigFile::default(), working_dir.to_path_buf()))
        }
    }
}

fn templates_dir_of(
    working_dir: &Path,
    file: &ConfigFile,
    file_dir: &Path,
    overrides: &ConfigOverrides,
) -> PathBuf {
    if let Some(dir) = &overrides.templates_dir {
        resolve_against(working_dir, dir.clone())
    } else if let Some(dir) = &file.templates_dir {
        resolve_against(file_dir, dir.clone())
    } else {
        file_dir.join(DEFAULT_TEMPLATES_DIR)
    }
}

/// Resolves only the templates directory. Unlike [`load_config`] this does not
/// require an ignore policy, so listing templates works without one.
pub fn load_templates_dir<P: AsRef<Path>>(
    working_dir: P,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<PathBuf> {
    let working_dir = working_dir.as_ref();
    let (file, file_dir) = read_config_file(working_dir, config_path)?;
    Ok(templates_dir_of(working_dir, &file, &file_dir, overrides))
}

/// Loads and resolves the engine configuration.
///
/// # Arguments
/// * `working_dir` - Absolute directory the run operates in
/// * `config_path` - Explicit configuration file; when `None` the working directory is searched
/// * `overrides` - Command-line values taking precedence over the file
///
/// # Errors
/// * `Error::ConfigError` if the file is invalid or no ignore policy was chosen
pub fn load_config<P: AsRef<Path>>(
    working_dir: P,
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<Config> {
    let working_dir = working_dir.as_ref();
    let (file, file_dir) = read_config_file(working_dir, config_path)?;

    let ignore_policy = overrides.ignore_policy.or(file.ignore_policy).ok_or_else(|| {
        Error::ConfigError(
            "no ignore policy configured; set `ignore_policy` to `root-canonical` or \
             `rename-in-place`, or pass --ignore-policy"
                .to_string(),
        )
    })?;

    let mut config = Config::new(working_dir, ignore_policy);
    config.templates_dir = templates_dir_of(working_dir, &file, &file_dir, &overrides);

    if let Some(path) = overrides.canonical_ignore {
        config.canonical_ignore = resolve_against(working_dir, path);
    } else if let Some(path) = file.canonical_ignore {
        config.canonical_ignore = resolve_against(&file_dir, path);
    }

    if let Some(line) = overrides.install {
        config.install = CommandSpec::from_command_line(&line)?;
    } else if let Some(install) = file.install {
        config.install = install;
    }

    if let Some(line) = overrides.start {
        config.start = CommandSpec::from_command_line(&line)?;
    } else if let Some(start) = file.start {
        config.start = start;
    }

    if let Some(ms) = overrides.port_timeout_ms.or(file.port_timeout_ms) {
        config.port_timeout = Duration::from_millis(ms);
    }
    if let Some(port) = file.default_port {
        config.default_port = port;
    }
    if let Some(fail_on_stderr) = file.fail_on_stderr {
        config.fail_on_stderr = fail_on_stderr;
    }
    config.exclude = file.exclude;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_from_line() {
        let command = CommandSpec::from_command_line("  pnpm   run dev ").unwrap();
        assert_eq!(command.program(), "pnpm");
        assert_eq!(command.args(), &["run".to_string(), "dev".to_string()]);
        assert_eq!(command.to_string(), "pnpm run dev");
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandSpec::from_command_line("   ").is_err());
        assert!(parse_config(r#"{"install": []}"#).is_err());
    }

    #[test]
    fn test_parse_yaml_fallback() {
        let config = parse_config("ignore_policy: rename-in-place\nstart: [yarn, dev]\n").unwrap();
        assert_eq!(config.ignore_policy, Some(IgnorePolicy::RenameInPlace));
        assert_eq!(config.start.unwrap().to_string(), "yarn dev");
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(parse_config(r#"{"ignore_policy": "merge"}"#).is_err());
    }
}
