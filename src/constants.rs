//! Common constants used throughout the Sprout application.

/// Supported configuration file names, searched in order
pub const CONFIG_FILES: [&str; 3] = ["sprout.json", "sprout.yml", "sprout.yaml"];

/// Ignore file written at the generated project root
pub const GITIGNORE: &str = ".gitignore";

/// Ignore file renamed to `.gitignore` under the rename-in-place policy
pub const NPMIGNORE: &str = ".npmignore";

/// Directory name pruned anywhere in a template
pub const NODE_MODULES: &str = "node_modules";

/// Default template root, relative to the configuration base directory
pub const DEFAULT_TEMPLATES_DIR: &str = "starters";

/// Port reported when the dev server never announces one
pub const DEFAULT_PORT: u16 = 3000;

/// How long to watch dev-server output for a port announcement
pub const DEFAULT_PORT_TIMEOUT_MS: u64 = 10_000;

pub const DEFAULT_INSTALL_COMMAND: [&str; 2] = ["npm", "install"];

pub const DEFAULT_START_COMMAND: [&str; 3] = ["npm", "run", "dev"];
