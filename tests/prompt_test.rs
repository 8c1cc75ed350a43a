use sprout::catalog::TemplateCatalog;
use sprout::error::Result;
use sprout::prompt::{ask_project_name, ask_template, Prompter};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use tempfile::TempDir;

/// Prompter answering from a script instead of a terminal.
#[derive(Default)]
struct ScriptedPrompter {
    selection: usize,
    inputs: RefCell<VecDeque<String>>,
    rejections: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    fn with_inputs(inputs: &[&str]) -> Self {
        Self {
            inputs: RefCell::new(inputs.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&self, _prompt: &str, _items: &[String]) -> Result<usize> {
        Ok(self.selection)
    }

    fn input(&self, _prompt: &str) -> Result<String> {
        Ok(self.inputs.borrow_mut().pop_front().expect("script ran out of answers"))
    }

    fn reject(&self, message: &str) {
        self.rejections.borrow_mut().push(message.to_string());
    }
}

fn catalog(temp_dir: &TempDir) -> TemplateCatalog {
    for id in ["basic-api", "nextjs"] {
        fs::create_dir(temp_dir.path().join(id)).unwrap();
    }
    TemplateCatalog::load(temp_dir.path()).unwrap()
}

#[test]
fn test_invalid_names_are_asked_again() {
    let prompt = ScriptedPrompter::with_inputs(&["my app", "app/../x", "my-app"]);

    let name = ask_project_name(&prompt, None).unwrap();

    assert_eq!(name, "my-app");
    let rejections = prompt.rejections.borrow();
    assert_eq!(rejections.len(), 2);
    assert!(rejections[0].contains("letters, numbers, underscores and hyphens"));
}

#[test]
fn test_preset_name_is_validated_not_prompted() {
    let prompt = ScriptedPrompter::default();

    assert_eq!(ask_project_name(&prompt, Some("site_2".to_string())).unwrap(), "site_2");
    let err = ask_project_name(&prompt, Some("my site".to_string())).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_template_selection() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = catalog(&temp_dir);
    let prompt = ScriptedPrompter { selection: 1, ..Default::default() };

    assert_eq!(ask_template(&prompt, &catalog, None).unwrap(), "nextjs");
    assert_eq!(
        ask_template(&prompt, &catalog, Some("basic-api".to_string())).unwrap(),
        "basic-api"
    );
    assert!(ask_template(&prompt, &catalog, Some("rails".to_string())).is_err());
}

#[test]
fn test_out_of_range_selection() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = catalog(&temp_dir);
    let prompt = ScriptedPrompter { selection: 7, ..Default::default() };

    assert!(ask_template(&prompt, &catalog, None).is_err());
}
