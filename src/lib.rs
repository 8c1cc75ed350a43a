//! Sprout creates a new project from a starter template, then installs its
//! dependencies and launches its dev server.

/// Template catalog: the starter templates available to a run
pub mod catalog;

/// Command-line interface module for the Sprout application
pub mod cli;

/// Engine configuration
/// Supports JSON and YAML formats (sprout.json, sprout.yml, sprout.yaml)
pub mod config;

/// Common constants
pub mod constants;

/// Error types and handling for the Sprout application
pub mod error;

/// Request validation and the generation pipeline
pub mod generator;

/// Ignore-file policies and resolution of the generated `.gitignore`
pub mod ignore;

/// Logger initialization
pub mod logger;

/// Recursive template copy
pub mod materializer;

/// Install and dev-server process orchestration
pub mod orchestrator;

/// Dev-server port discovery
pub mod port;

/// User input and interaction handling
pub mod prompt;
