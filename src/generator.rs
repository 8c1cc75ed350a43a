//! Project generation: validates a request, materializes the chosen template and
//! finalizes the ignore file.

use crate::catalog::TemplateCatalog;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::ignore::{IgnoreFileResolver, IgnorePolicy};
use crate::materializer::{build_exclude_set, Materializer};
use crate::prompt::validate_project_name;
use globset::GlobSet;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRequest {
    pub template_id: String,
    pub project_name: String,
    /// Absolute directory the project directory is created in
    pub working_directory: PathBuf,
}

impl ProjectRequest {
    pub fn new<S: Into<String>, N: Into<String>, P: Into<PathBuf>>(
        template_id: S,
        project_name: N,
        working_directory: P,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            project_name: project_name.into(),
            working_directory: working_directory.into(),
        }
    }

    /// `working_directory/project_name`.
    pub fn destination(&self) -> PathBuf {
        self.working_directory.join(&self.project_name)
    }

    /// Checks the request without touching the filesystem and returns the template root.
    ///
    /// # Errors
    /// * `Error::ValidationError` for a bad name, an unknown template or a relative
    ///   working directory
    pub fn validate(&self, catalog: &TemplateCatalog) -> Result<PathBuf> {
        validate_project_name(&self.project_name)?;
        if !self.working_directory.is_absolute() {
            return Err(Error::ValidationError(format!(
                "working directory '{}' must be absolute",
                self.working_directory.display()
            )));
        }
        catalog.lookup(&self.template_id)
    }
}

/// A freshly generated project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProject {
    pub root: PathBuf,
    pub files: usize,
    pub directories: usize,
    /// Content of the root `.gitignore`, if one was produced
    pub ignore_content: Option<Vec<u8>>,
}

/// Generates projects from a template catalog under one ignore policy.
#[derive(Debug)]
pub struct Generator {
    catalog: TemplateCatalog,
    resolver: IgnoreFileResolver,
    exclude: GlobSet,
}

impl Generator {
    pub fn new(catalog: TemplateCatalog, resolver: IgnoreFileResolver) -> Self {
        Self { catalog, resolver, exclude: GlobSet::empty() }
    }

    /// Loads the catalog and the ignore resolver described by `config`.
    ///
    /// Under the root-canonical policy this is where the canonical ignore file is read.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = TemplateCatalog::load(&config.templates_dir)?;
        let resolver = IgnoreFileResolver::new(config.ignore_policy, &config.canonical_ignore)?;
        let exclude = build_exclude_set(&config.exclude)?;
        Ok(Self { catalog, resolver, exclude })
    }

    pub fn with_exclude(mut self, exclude: GlobSet) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> IgnorePolicy {
        self.resolver.policy()
    }

    /// Resolves and writes the ignore file of an already materialized project.
    pub fn finalize_ignore<P: AsRef<Path>>(&self, project_root: P) -> Result<Option<Vec<u8>>> {
        self.resolver.finalize(project_root)
    }

    /// Generates the project described by `request`.
    ///
    /// Nothing is written unless the request validates and the destination is absent.
    /// A failure after that point leaves the partial tree in place.
    pub fn generate(&mut self, request: &ProjectRequest) -> Result<GeneratedProject> {
        let template_root = request.validate(&self.catalog)?;
        let root = request.destination();
        debug!(
            "Generating '{}' from {} ({})",
            request.project_name,
            template_root.display(),
            self.resolver.policy()
        );

        let report = Materializer::new(&template_root, &root)
            .with_exclude(self.exclude.clone())
            .run(&mut self.resolver)?;
        let ignore_content = self.resolver.finalize(&root)?;

        info!(
            "Created {} files and {} directories in {}",
            report.files,
            report.directories,
            root.display()
        );

        Ok(GeneratedProject {
            root,
            files: report.files,
            directories: report.directories,
            ignore_content,
        })
    }
}
