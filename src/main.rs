//! Sprout's main application entry point and orchestration logic.
//! Handles command-line argument parsing, the prompt session, project generation
//! and the install/start steps.

use std::path::PathBuf;

use sprout::{
    catalog::TemplateCatalog,
    cli::{get_args, Args},
    config::{load_config, load_templates_dir},
    error::{default_error_handler, Error, Result},
    generator::{Generator, ProjectRequest},
    logger::init_logger,
    orchestrator::ProcessOrchestrator,
    prompt::{ask_project_name, ask_template, DialoguerPrompter},
};

/// Main application entry point.
fn main() {
    let args = get_args();

    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Resolves the directory projects are created in, once, as an absolute path.
fn working_directory(directory: Option<PathBuf>) -> Result<PathBuf> {
    let directory = match directory {
        Some(directory) => directory,
        None => std::env::current_dir()?,
    };
    directory.canonicalize().map_err(Error::at_path(&directory))
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads configuration and the template catalog
/// 2. Prompts for the template and the project name
/// 3. Generates the project and its .gitignore
/// 4. Runs the install command, then starts the dev server
fn run(args: Args) -> Result<()> {
    let working_dir = working_directory(args.directory.clone())?;

    if args.list {
        let templates_dir =
            load_templates_dir(&working_dir, args.config.as_deref(), &args.overrides())?;
        for id in TemplateCatalog::load(templates_dir)?.ids() {
            println!("{}", id);
        }
        return Ok(());
    }

    let config = load_config(&working_dir, args.config.as_deref(), args.overrides())?;
    let mut generator = Generator::from_config(&config)?;

    let prompt = DialoguerPrompter::new();
    let template_id = ask_template(&prompt, generator.catalog(), args.template)?;
    let project_name = ask_project_name(&prompt, args.name)?;

    let request = ProjectRequest::new(template_id, project_name, working_dir);
    let project = generator.generate(&request)?;
    println!("Project '{}' created in {}.", request.project_name, project.root.display());

    if args.no_run {
        return Ok(());
    }

    let mut orchestrator = ProcessOrchestrator::new(&project.root, &config);
    if let Err(e) = orchestrator.install() {
        eprintln!("Generated files were left in {}.", project.root.display());
        return Err(e);
    }

    let mut server = match orchestrator.start() {
        Ok(server) => server,
        Err(e) => {
            log::warn!(
                "Dev server did not start; installed project kept in {}",
                project.root.display()
            );
            return Err(e);
        }
    };

    if !server.port_announced() {
        log::warn!("Dev server did not announce a port; assuming {}", server.port());
    }
    println!("Dev server running at http://localhost:{} (pid {}).", server.port(), server.pid());

    let status = server.wait()?;
    log::debug!("Dev server exited with {}", status);

    Ok(())
}
