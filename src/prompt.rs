//! Operator interaction: template selection and project name entry.
//! Terminal I/O sits behind the [`Prompter`] trait so the answer loop can be driven
//! without a terminal.

use crate::catalog::TemplateCatalog;
use crate::error::{Error, Result};
use dialoguer::{Input, Select};
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

const PROJECT_NAME_PATTERN: &str = r"^[A-Za-z0-9_-]+$";

fn project_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PROJECT_NAME_PATTERN).expect("project name pattern is valid"))
}

/// Checks a project name against `^[A-Za-z0-9_-]+$`.
///
/// # Errors
/// * `Error::ValidationError` with an operator-facing explanation
pub fn validate_project_name(name: &str) -> Result<()> {
    if project_name_regex().is_match(name) {
        Ok(())
    } else {
        Err(Error::ValidationError(format!(
            "invalid project name '{}': project name may only include letters, numbers, \
             underscores and hyphens",
            name
        )))
    }
}

/// Low-level terminal operations.
pub trait Prompter {
    /// Lets the operator pick one of `items`; returns its index.
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize>;

    /// Reads one line of text.
    fn input(&self, prompt: &str) -> Result<String>;

    /// Shows a message explaining why the previous answer was rejected.
    fn reject(&self, message: &str);
}

/// [`Prompter`] backed by `dialoguer`.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize> {
        Select::new()
            .with_prompt(prompt)
            .default(0)
            .items(items)
            .interact()
            .map_err(|e| Error::PromptError(e.to_string()))
    }

    fn input(&self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(|e| Error::PromptError(e.to_string()))
    }

    fn reject(&self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Returns the chosen template identifier.
///
/// A preset (from the command line) is checked against the catalog instead of prompting.
pub fn ask_template(
    prompt: &dyn Prompter,
    catalog: &TemplateCatalog,
    preset: Option<String>,
) -> Result<String> {
    if let Some(id) = preset {
        catalog.lookup(&id)?;
        return Ok(id);
    }
    let index = prompt.select("Select starter template", catalog.ids())?;
    catalog
        .ids()
        .get(index)
        .cloned()
        .ok_or_else(|| Error::PromptError(format!("selection {} out of range", index)))
}

/// Returns a validated project name.
///
/// Invalid interactive answers are reported and asked again. A preset name that fails
/// validation is returned as an error since there is nobody to ask.
pub fn ask_project_name(prompt: &dyn Prompter, preset: Option<String>) -> Result<String> {
    if let Some(name) = preset {
        validate_project_name(&name)?;
        return Ok(name);
    }
    loop {
        let name = prompt.input("Enter your project name")?;
        match validate_project_name(&name) {
            Ok(()) => return Ok(name),
            Err(e) => {
                debug!("Rejected project name {:?}", name);
                prompt.reject(&e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_project_name() {
        for name in ["app", "my-app", "my_app", "App2", "-", "_x_"] {
            assert!(validate_project_name(name).is_ok(), "{name}");
        }
        for name in ["", "my app", "app/evil", "..", "app.js", "naïve", "a\n"] {
            assert!(validate_project_name(name).is_err(), "{name:?}");
        }
    }
}
