//! Recursive materialization of a template tree into a new project directory.
//!
//! Files are copied byte for byte. `node_modules` entries are pruned at any depth,
//! ignore markers can be diverted to an [`IgnoreEventSink`], and anything that is
//! neither a regular file nor a directory aborts the run. A failure part way through
//! leaves the partially populated destination in place.

use crate::constants::NODE_MODULES;
use crate::error::{Error, Result};
use crate::ignore::{is_ignore_marker, IgnoreEventSink, IgnoreMarker};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Counts of what was written under the project root (the root itself excluded).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeReport {
    pub files: usize,
    pub directories: usize,
}

/// Compiles extra exclusion globs, matched against template-relative paths.
///
/// # Errors
/// * `Error::GlobError` if any pattern is invalid
pub fn build_exclude_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }
    Ok(builder.build()?)
}

/// Mirrors one template directory into one destination directory.
pub struct Materializer<'a> {
    template_root: &'a Path,
    destination_root: &'a Path,
    exclude: GlobSet,
}

impl<'a> Materializer<'a> {
    pub fn new(template_root: &'a Path, destination_root: &'a Path) -> Self {
        Self { template_root, destination_root, exclude: GlobSet::empty() }
    }

    pub fn with_exclude(mut self, exclude: GlobSet) -> Self {
        self.exclude = exclude;
        self
    }

    /// Maps a template-relative path into the destination root.
    ///
    /// # Errors
    /// * `Error::PathEscapeError` unless every component is a plain name
    pub fn destination_for(&self, relative: &Path) -> Result<PathBuf> {
        if relative.as_os_str().is_empty()
            || !relative.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(Error::PathEscapeError { path: self.destination_root.join(relative) });
        }
        Ok(self.destination_root.join(relative))
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        if entry.file_name() == NODE_MODULES {
            debug!("Pruning {}", entry.path().display());
            return true;
        }
        match entry.path().strip_prefix(self.template_root) {
            Ok(relative) if self.exclude.is_match(relative) => {
                debug!("Excluding {}", relative.display());
                true
            }
            _ => false,
        }
    }

    /// Creates the destination root and copies the template tree into it.
    ///
    /// Entries are visited depth-first, siblings sorted by file name.
    ///
    /// # Errors
    /// * `Error::OutputDirectoryExistsError` if the destination root exists; nothing is written
    /// * `Error::UnsupportedEntryError` for symlinks and special files
    /// * `Error::PathIoError` for read/write failures
    pub fn run(&self, sink: &mut dyn IgnoreEventSink) -> Result<MaterializeReport> {
        let dest_root = self.destination_root;
        let output_dir = dest_root.display().to_string();

        if fs::symlink_metadata(dest_root).is_ok() {
            return Err(Error::OutputDirectoryExistsError { output_dir });
        }
        if !self.template_root.is_dir() {
            return Err(Error::ValidationError(format!(
                "template '{}' is not a directory",
                self.template_root.display()
            )));
        }
        fs::create_dir(dest_root).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => Error::OutputDirectoryExistsError { output_dir },
            _ => Error::PathIoError { path: dest_root.to_path_buf(), source: e },
        })?;
        debug!("Created {}", dest_root.display());

        let intercept = sink.intercepts_markers();
        let mut report = MaterializeReport::default();

        let walker = WalkDir::new(self.template_root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path =
                    e.path().map(Path::to_path_buf).unwrap_or_else(|| self.template_root.into());
                Error::PathIoError { path, source: e.into() }
            })?;
            let source = entry.path();
            let relative = source
                .strip_prefix(self.template_root)
                .map_err(|_| Error::PathEscapeError { path: source.to_path_buf() })?;
            let target = self.destination_for(relative)?;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                fs::create_dir(&target).map_err(Error::at_path(&target))?;
                report.directories += 1;
            } else if file_type.is_file() {
                let content = fs::read(source).map_err(Error::at_path(source))?;
                let is_marker = entry.file_name().to_str().is_some_and(is_ignore_marker);
                if intercept && is_marker {
                    sink.on_marker(IgnoreMarker { relative_path: relative.to_path_buf(), content });
                    continue;
                }
                fs::write(&target, &content).map_err(Error::at_path(&target))?;
                debug!("Copied {}", relative.display());
                report.files += 1;
            } else {
                return Err(Error::UnsupportedEntryError { path: source.display().to_string() });
            }
        }

        Ok(report)
    }
}
