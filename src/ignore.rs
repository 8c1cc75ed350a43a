//! Ignore-file resolution for generated projects.
//! Decides what the final `.gitignore` at the project root looks like, under one of
//! two mutually exclusive policies chosen at startup.

use crate::constants::{GITIGNORE, NPMIGNORE};
use crate::error::{Error, Result};
use clap::ValueEnum;
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// How the generated project's `.gitignore` is produced.
///
/// There is deliberately no default: the configuration must name one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum IgnorePolicy {
    /// Discard every ignore marker in the template and write one canonical
    /// `.gitignore`, read once at startup.
    RootCanonical,
    /// Copy ignore markers through untouched, then rename a top-level
    /// `.npmignore` to `.gitignore`.
    RenameInPlace,
}

impl IgnorePolicy {
    /// Whether the materializer should divert ignore markers instead of copying them.
    pub fn intercepts_markers(self) -> bool {
        matches!(self, IgnorePolicy::RootCanonical)
    }
}

impl std::fmt::Display for IgnorePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnorePolicy::RootCanonical => write!(f, "root-canonical"),
            IgnorePolicy::RenameInPlace => write!(f, "rename-in-place"),
        }
    }
}

/// Returns true for file names that are treated as ignore markers.
pub fn is_ignore_marker(file_name: &str) -> bool {
    file_name == GITIGNORE || file_name == NPMIGNORE
}

/// An ignore-marker file found during materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreMarker {
    /// Path relative to the template root
    pub relative_path: PathBuf,
    pub content: Vec<u8>,
}

/// Receives ignore-marker events from the materializer.
pub trait IgnoreEventSink {
    /// When false, markers are copied as ordinary files and never reported.
    fn intercepts_markers(&self) -> bool;

    fn on_marker(&mut self, marker: IgnoreMarker);
}

/// Produces the single `.gitignore` of a generated project.
#[derive(Debug)]
pub struct IgnoreFileResolver {
    policy: IgnorePolicy,
    canonical: Option<Vec<u8>>,
    discarded: Vec<PathBuf>,
}

impl IgnoreFileResolver {
    /// Creates a resolver for `policy`. Under the root-canonical policy the canonical
    /// ignore file is read here, once; it is never consulted otherwise.
    ///
    /// # Errors
    /// * `Error::ConfigError` if the canonical ignore file cannot be read
    pub fn new<P: AsRef<Path>>(policy: IgnorePolicy, canonical_path: P) -> Result<Self> {
        match policy {
            IgnorePolicy::RootCanonical => {
                let canonical_path = canonical_path.as_ref();
                let content = fs::read(canonical_path).map_err(|e| {
                    Error::ConfigError(format!(
                        "cannot read canonical ignore file '{}': {}",
                        canonical_path.display(),
                        e
                    ))
                })?;
                debug!("Loaded canonical ignore file from {}", canonical_path.display());
                Ok(Self::with_canonical_content(content))
            }
            IgnorePolicy::RenameInPlace => Ok(Self::rename_in_place()),
        }
    }

    pub fn with_canonical_content<C: Into<Vec<u8>>>(content: C) -> Self {
        Self {
            policy: IgnorePolicy::RootCanonical,
            canonical: Some(content.into()),
            discarded: Vec::new(),
        }
    }

    pub fn rename_in_place() -> Self {
        Self { policy: IgnorePolicy::RenameInPlace, canonical: None, discarded: Vec::new() }
    }

    pub fn policy(&self) -> IgnorePolicy {
        self.policy
    }

    /// Template-relative paths of the markers discarded so far.
    pub fn discarded(&self) -> &[PathBuf] {
        &self.discarded
    }

    /// Writes the final ignore file into `project_root` and returns its content.
    ///
    /// Calling this twice with the same inputs leaves byte-identical content.
    /// Returns `None` only under rename-in-place when the project root has neither
    /// a `.npmignore` nor a `.gitignore`.
    pub fn finalize<P: AsRef<Path>>(&self, project_root: P) -> Result<Option<Vec<u8>>> {
        let project_root = project_root.as_ref();
        let gitignore = project_root.join(GITIGNORE);

        match (&self.policy, &self.canonical) {
            (IgnorePolicy::RootCanonical, Some(content)) => {
                fs::write(&gitignore, content).map_err(Error::at_path(&gitignore))?;
                debug!("Wrote canonical {}", gitignore.display());
                Ok(Some(content.clone()))
            }
            (IgnorePolicy::RootCanonical, None) => {
                Err(Error::ConfigError("canonical ignore content was not loaded".to_string()))
            }
            (IgnorePolicy::RenameInPlace, _) => {
                let npmignore = project_root.join(NPMIGNORE);
                if npmignore.is_file() {
                    fs::rename(&npmignore, &gitignore).map_err(Error::at_path(&npmignore))?;
                    debug!("Renamed {} to {}", npmignore.display(), GITIGNORE);
                }
                if gitignore.is_file() {
                    let content = fs::read(&gitignore).map_err(Error::at_path(&gitignore))?;
                    Ok(Some(content))
                } else {
                    warn!("Template has no top-level {}; no {} produced", NPMIGNORE, GITIGNORE);
                    Ok(None)
                }
            }
        }
    }
}

impl IgnoreEventSink for IgnoreFileResolver {
    fn intercepts_markers(&self) -> bool {
        self.policy.intercepts_markers()
    }

    fn on_marker(&mut self, marker: IgnoreMarker) {
        debug!(
            "Discarding ignore marker {} ({} bytes)",
            marker.relative_path.display(),
            marker.content.len()
        );
        self.discarded.push(marker.relative_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ignore_marker() {
        assert!(is_ignore_marker(".gitignore"));
        assert!(is_ignore_marker(".npmignore"));
        assert!(!is_ignore_marker(".dockerignore"));
        assert!(!is_ignore_marker("gitignore"));
    }

    #[test]
    fn test_policy_display_matches_config_names() {
        assert_eq!(IgnorePolicy::RootCanonical.to_string(), "root-canonical");
        assert_eq!(IgnorePolicy::RenameInPlace.to_string(), "rename-in-place");
        assert!(IgnorePolicy::RootCanonical.intercepts_markers());
        assert!(!IgnorePolicy::RenameInPlace.intercepts_markers());
    }
}
