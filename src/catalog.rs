//! Enumeration of the starter templates available to a run.

use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// The set of templates found under a templates directory.
///
/// Each immediate, non-hidden subdirectory is one template; its directory name is
/// the template identifier.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    root: PathBuf,
    ids: Vec<String>,
}

impl TemplateCatalog {
    /// Scans `root` for templates, sorted by identifier.
    ///
    /// # Errors
    /// * `Error::ConfigError` if `root` is not a readable directory or holds no templates
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let entries = fs::read_dir(root).map_err(|e| {
            Error::ConfigError(format!("cannot read templates directory '{}': {}", root.display(), e))
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Error::at_path(root))?;
            let file_type = entry.file_type().map_err(Error::at_path(entry.path()))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                debug!("Skipping non UTF-8 entry {}", entry.path().display());
                continue;
            };
            if file_type.is_dir() && !name.starts_with('.') {
                ids.push(name);
            }
        }
        ids.sort();

        if ids.is_empty() {
            return Err(Error::ConfigError(format!(
                "no templates found in '{}'",
                root.display()
            )));
        }
        debug!("Found {} templates in {}", ids.len(), root.display());

        Ok(Self { root: root.to_path_buf(), ids })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    /// Returns the root directory of template `id`.
    ///
    /// # Errors
    /// * `Error::ValidationError` listing the known identifiers if `id` is unknown
    pub fn lookup(&self, id: &str) -> Result<PathBuf> {
        if self.contains(id) {
            Ok(self.root.join(id))
        } else {
            Err(Error::ValidationError(format!(
                "unknown template '{}' (available: {})",
                id,
                self.ids.join(", ")
            )))
        }
    }
}
