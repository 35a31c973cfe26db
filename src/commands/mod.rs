//! # CLI Command Implementations
//!
//! Each subcommand of the `textmill` command-line tool lives in its own
//! module with an `Args` struct (derived with `clap`) and an `execute`
//! function that calls into the `textmill` library.

pub mod completions;
pub mod process;
