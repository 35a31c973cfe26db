//! # Error Handling
//!
//! Centralized error handling for `textmill`. A single `Error` enum covers
//! every anticipated failure mode, built with `thiserror` so each variant
//! carries a descriptive message plus any contextual fields.
//!
//! Two kinds of failure flow through the engine:
//!
//! - **Hard errors** (`Error`): setup mistakes and internal failures that
//!   abort the run before (or regardless of) any file being processed.
//! - **Per-file failures**: recorded as fatal [`Message`](crate::vfile::Message)s
//!   on the affected virtual file by the stage runner; they never abort the
//!   batch. Stage functions still return `Error` internally, the runner
//!   converts them.
//!
//! The `Result<T>` alias is used throughout the library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for textmill operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid engine invocation, detected before any file is touched.
    #[error("Setup error: {message}")]
    Setup { message: String },

    /// A configuration file could not be read, parsed, or merged.
    ///
    /// Includes the offending file when known.
    #[error("Configuration error{}: {message}", source_path.as_ref().map(|p| format!(" in `{}`", p.display())).unwrap_or_default())]
    Configuration {
        message: String,
        /// The configuration file that caused the error, if applicable
        source_path: Option<PathBuf>,
    },

    /// An ignore file could not be read or parsed.
    #[error("Cannot read ignore file `{path}`: {message}")]
    Ignore { path: String, message: String },

    /// A plugin name did not resolve to a known plugin.
    #[error("Cannot resolve plugin `{name}`")]
    PluginResolve { name: String },

    /// A resolved plugin id could not be loaded.
    #[error("Cannot load plugin `{id}`: {message}")]
    PluginLoad { id: String, message: String },

    /// A plugin failed while running.
    #[error("Plugin `{id}` failed: {message}")]
    Plugin { id: String, message: String },

    /// The processor failed to parse or stringify a file.
    #[error("Processor error: {message}")]
    Processor { message: String },

    /// An error occurred during a per-file pipeline stage.
    #[error("{message}")]
    Stage { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Shorthand for a stage-level failure with a plain message.
    pub fn stage(message: impl Into<String>) -> Self {
        Error::Stage {
            message: message.into(),
        }
    }

    /// Shorthand for a setup failure with a plain message.
    pub fn setup(message: impl Into<String>) -> Self {
        Error::Setup {
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
