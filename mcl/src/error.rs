//! Error types shared across the crate.
//!
//! Every script-level error carries the path-qualified script name
//! (e.g. `example.date.utc`) so the CLI can report it verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while substituting markers in a single template line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// `index` is the marker's number as written, without leading zeros.
    #[error("Missing positional argument ${index}")]
    MissingArgument { index: String },

    #[error("Unknown variable '${name}'")]
    UnknownVariable { name: String },
}

/// Failures raised while resolving or rendering a script.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Script '{name}' is not defined")]
    ScriptNotFound { name: String },

    #[error("Script '{script}' requires a subcommand. Available options: {}", .available.join(", "))]
    AmbiguousScript {
        script: String,
        available: Vec<String>,
    },

    #[error("Selection for '{script}' cancelled by user")]
    Cancelled { script: String },

    #[error("Script '{script}' has no subcommand '{key}'. Available options: {}", .available.join(", "))]
    UnknownSubcommand {
        script: String,
        key: String,
        available: Vec<String>,
    },

    #[error("Script '{script}' must contain only string steps (found {found})")]
    MalformedScript { script: String, found: &'static str },

    #[error("Script '{script}': {source}")]
    Template {
        script: String,
        #[source]
        source: TemplateError,
    },
}

/// Failures raised while loading or writing configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unable to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration in {} must be a JSON object", .path.display())]
    NotAnObject { path: PathBuf },

    #[error("Configuration key '{key}' must be an object")]
    InvalidSection { key: &'static str },

    #[error("Variable '{name}' must be a string, number or boolean")]
    InvalidVariable { name: String },

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Could not determine current directory: {source}")]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error for a single `mcl` invocation.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("Command '{command}' failed {}", .code.map_or_else(|| "(terminated by signal)".to_string(), |c| format!("with exit code {c}")))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Unable to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Editor(String),

    #[error("{0}")]
    Plugin(String),
}

pub type Result<T> = std::result::Result<T, Error>;
