use sprout::catalog::TemplateCatalog;
use sprout::config::Config;
use sprout::error::Error;
use sprout::generator::{Generator, ProjectRequest};
use sprout::ignore::{IgnoreFileResolver, IgnorePolicy};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Lays out `starters/basic-api` plus a canonical `.gitignore` and a working directory.
fn workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let starter = temp_dir.path().join("starters/basic-api");
    write(&starter, "index.ts", "export default {};\n");
    write(&starter, ".npmignore", "dist\n");
    write(&starter, "lib/.gitignore", "build\n");
    write(&starter, "lib/util.ts", "export const x = 1;\n");
    write(&starter, "node_modules/dep/index.js", "1\n");
    write(temp_dir.path(), "canonical/.gitignore", "node_modules\n.env\n");
    fs::create_dir(temp_dir.path().join("work")).unwrap();
    temp_dir
}

fn config(temp_dir: &TempDir, policy: IgnorePolicy) -> Config {
    let mut config = Config::new(temp_dir.path(), policy);
    config.canonical_ignore = temp_dir.path().join("canonical/.gitignore");
    config
}

fn count_gitignores(root: &Path) -> usize {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() == ".gitignore")
        .count()
}

#[test]
fn test_root_canonical_generation() {
    let temp_dir = workspace();
    let mut generator =
        Generator::from_config(&config(&temp_dir, IgnorePolicy::RootCanonical)).unwrap();
    let request = ProjectRequest::new("basic-api", "my-app", temp_dir.path().join("work"));

    let project = generator.generate(&request).unwrap();

    assert_eq!(project.root, temp_dir.path().join("work/my-app"));
    assert_eq!(project.files, 2);
    assert_eq!(project.directories, 1);
    assert_eq!(project.ignore_content.as_deref(), Some(&b"node_modules\n.env\n"[..]));
    assert_eq!(
        fs::read_to_string(project.root.join(".gitignore")).unwrap(),
        "node_modules\n.env\n"
    );
    assert!(!project.root.join(".npmignore").exists());
    assert!(!project.root.join("node_modules").exists());
    assert_eq!(count_gitignores(&project.root), 1);
}

#[test]
fn test_rename_in_place_generation() {
    let temp_dir = workspace();
    let mut generator =
        Generator::from_config(&config(&temp_dir, IgnorePolicy::RenameInPlace)).unwrap();
    let request = ProjectRequest::new("basic-api", "my_app", temp_dir.path().join("work"));

    let project = generator.generate(&request).unwrap();

    assert_eq!(project.ignore_content.as_deref(), Some(&b"dist\n"[..]));
    assert_eq!(fs::read_to_string(project.root.join(".gitignore")).unwrap(), "dist\n");
    assert!(!project.root.join(".npmignore").exists());
    assert_eq!(fs::read_to_string(project.root.join("lib/.gitignore")).unwrap(), "build\n");
    assert!(project.root.join("lib/util.ts").exists());
}

#[test]
fn test_ignore_finalization_is_idempotent() {
    let temp_dir = workspace();
    for policy in [IgnorePolicy::RootCanonical, IgnorePolicy::RenameInPlace] {
        let mut generator = Generator::from_config(&config(&temp_dir, policy)).unwrap();
        let request =
            ProjectRequest::new("basic-api", format!("app-{policy}"), temp_dir.path().join("work"));

        let project = generator.generate(&request).unwrap();
        let again = generator.finalize_ignore(&project.root).unwrap();

        assert_eq!(again, project.ignore_content);
        assert_eq!(
            fs::read(project.root.join(".gitignore")).unwrap(),
            project.ignore_content.unwrap()
        );
    }
}

#[test]
fn test_invalid_name_has_no_side_effects() {
    let temp_dir = workspace();
    let work = temp_dir.path().join("work");
    let mut generator =
        Generator::from_config(&config(&temp_dir, IgnorePolicy::RootCanonical)).unwrap();

    for name in ["my app", "../escape", "", "a/b"] {
        let err = generator.generate(&ProjectRequest::new("basic-api", name, &work)).unwrap_err();
        assert!(err.is_validation(), "{name:?}: {err}");
    }
    assert_eq!(fs::read_dir(&work).unwrap().count(), 0);
    assert!(!temp_dir.path().join("escape").exists());
}

#[test]
fn test_unknown_template_has_no_side_effects() {
    let temp_dir = workspace();
    let work = temp_dir.path().join("work");
    let mut generator =
        Generator::from_config(&config(&temp_dir, IgnorePolicy::RootCanonical)).unwrap();

    let err = generator.generate(&ProjectRequest::new("rails", "app", &work)).unwrap_err();

    assert!(err.is_validation());
    assert_eq!(fs::read_dir(&work).unwrap().count(), 0);
}

#[test]
fn test_existing_target_fails() {
    let temp_dir = workspace();
    let work = temp_dir.path().join("work");
    write(&work, "my-app/README.md", "already here\n");
    let mut generator =
        Generator::from_config(&config(&temp_dir, IgnorePolicy::RootCanonical)).unwrap();

    let err = generator.generate(&ProjectRequest::new("basic-api", "my-app", &work)).unwrap_err();

    assert!(matches!(err, Error::OutputDirectoryExistsError { .. }));
    let entries: Vec<_> =
        fs::read_dir(work.join("my-app")).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(entries, vec!["README.md"]);
}

#[test]
fn test_relative_working_directory_rejected() {
    let temp_dir = workspace();
    let catalog = TemplateCatalog::load(temp_dir.path().join("starters")).unwrap();
    let mut generator = Generator::new(catalog, IgnoreFileResolver::rename_in_place());

    let err = generator.generate(&ProjectRequest::new("basic-api", "app", "work")).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(generator.policy(), IgnorePolicy::RenameInPlace);
}
