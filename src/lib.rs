//! # Textmill Library
//!
//! This library provides the core functionality of the `textmill` batch
//! text-processing engine. It is designed to be used by the `textmill`
//! command-line tool but can also be embedded by applications that need to
//! run a parser/plugin pipeline over a set of files.
//!
//! ## Quick Example
//!
//! ```
//! use textmill::engine::{run, Input, Options};
//! use textmill::processor::TextProcessor;
//! use textmill::vfile::VirtualFile;
//!
//! // Build a pre-filled file; it bypasses discovery and disk reads.
//! let mut file = VirtualFile::new("example.txt", ".");
//! file.contents = Some("hello\n".to_string());
//!
//! let mut options = Options::new(Box::new(TextProcessor));
//! options.files.push(Input::File(file));
//! options.stream_err = Some(Box::new(Vec::new()));
//!
//! let result = run(options).unwrap();
//! assert_eq!(result.exit_code, 0);
//! ```
//!
//! ## Core Concepts
//!
//! - **Virtual files (`vfile`)**: in-memory documents carrying a path,
//!   contents, and diagnostics, independent of the disk.
//! - **Discovery (`finder`, `ignore`)**: expands glob patterns and literal
//!   paths into a deduplicated, sorted file list, honoring line-oriented
//!   ignore patterns with last-match-wins negation.
//! - **Configuration (`configuration`)**: per-directory layered rc files
//!   (JSON/YAML/TOML/`package.json`), deep-merged nearest-wins, with preset
//!   expansion and plugins keyed by resolved identity.
//! - **Plugins (`plugin`)**: per-file transforms and file-set-level plugins
//!   behind an explicit loader seam.
//! - **Stages (`stages`)**: the fixed per-file pipeline (configure, read,
//!   parse, transform, queue, stringify, copy, stdout, write) where stage
//!   failures become fatal messages rather than aborting the batch.
//! - **File set (`fileset`)**: origin-deduplicated file collection with the
//!   queue barrier that runs file-set-level plugins exactly once.
//!
//! ## Execution Flow
//!
//! The main entry point is [`engine::run`], which validates the invocation,
//! discovers files (or reads standard input), drives every file through the
//! stage pipeline around the single barrier firing, and finally writes a
//! consolidated diagnostics report, yielding an exit code.

pub mod configuration;
pub mod engine;
pub mod error;
pub mod fileset;
pub mod finder;
pub mod ignore;
pub mod plugin;
pub mod processor;
pub mod report;
pub mod stages;
pub mod vfile;

#[cfg(test)]
mod ignore_proptest;
