//! Implementation of the per-file pipeline stages.
//!
//! ## Overview
//!
//! Every file runs through a fixed ordered sequence of stages:
//! 1. Configure - resolve configuration and attach plugins
//! 2. Read - fill contents from disk if absent
//! 3. Parse - build the syntax tree (or deserialize it in tree-in mode)
//! 4. Transform - run the configured plugins over the tree
//! 5. Queue - register at the file-set barrier
//! 6. Stringify - compile the tree back to text when output is requested
//! 7. Copy - compute the output location
//! 8. Stdout - write to the output stream in single-file runs
//! 9. Write - write to the filesystem
//!
//! The runner never aborts on a stage failure: an `Err` becomes a fatal
//! message on the file and the remaining stages still run, each skipping
//! substantive work once the file is fatal. Stages 1-5 form the front half;
//! the engine fires the file-set barrier between the halves.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::trace;
use serde_json::Value;

use crate::configuration::{ConfigResolver, OutputTarget};
use crate::error::Result;
use crate::fileset::FileSet;
use crate::plugin::{Plugin, PluginLoader};
use crate::processor::{Processor, Settings, Tree};
use crate::vfile::VirtualFile;

// Stage modules
pub mod configure;
pub mod copy;
pub mod parse;
pub mod queue;
pub mod read;
pub mod stdout;
pub mod stringify;
pub mod transform;
pub mod write;

/// Run-wide immutable state shared by every stage.
pub struct RunState<'a> {
    pub processor: &'a dyn Processor,
    /// Deserialize input contents as a JSON tree instead of parsing
    pub tree_in: bool,
    /// Serialize the tree as JSON instead of stringifying
    pub tree_out: bool,
    /// Write serialized contents to the output stream
    pub out: bool,
    /// Stringify even when no output destination is set
    pub always_stringify: bool,
    /// Number of given files in the run
    pub file_count: usize,
    pub cwd: &'a Path,
    /// Programmatically injected plugins, attached after configured ones
    pub injected: &'a [(Arc<dyn Plugin>, Value)],
}

/// Mutable per-file state threaded through the stages.
#[derive(Default)]
pub struct Context {
    /// The parsed tree, once `parse` has run
    pub tree: Option<Tree>,
    /// Plugins attached during `configure`, with their options
    pub plugins: Vec<(Arc<dyn Plugin>, Value)>,
    /// Settings resolved for this file
    pub settings: Settings,
    /// Output routing resolved for this file
    pub output: Option<OutputTarget>,
}

/// Everything a stage can touch.
pub struct StageCtx<'a, 'b> {
    pub run: &'a RunState<'b>,
    pub file: &'a mut VirtualFile,
    pub ctx: &'a mut Context,
    pub set: &'a mut FileSet,
    pub resolver: &'a mut ConfigResolver,
    pub loader: &'a dyn PluginLoader,
    pub stream_out: &'a mut dyn Write,
}

/// One pipeline stage.
pub type Stage = fn(&mut StageCtx<'_, '_>) -> Result<()>;

/// Stages up to and including the queue barrier.
pub const FRONT: &[(&str, Stage)] = &[
    ("configure", configure::run),
    ("read", read::run),
    ("parse", parse::run),
    ("transform", transform::run),
    ("queue", queue::run),
];

/// Stages after the barrier.
pub const BACK: &[(&str, Stage)] = &[
    ("stringify", stringify::run),
    ("copy", copy::run),
    ("stdout", stdout::run),
    ("write", write::run),
];

/// Run a stage list over one file.
///
/// Failure is recorded, not propagated: a stage error is attached to the
/// file as a fatal message tagged with the stage name, and the next stage
/// still runs.
pub fn run_stages(stages: &[(&str, Stage)], sctx: &mut StageCtx<'_, '_>) {
    for &(name, stage) in stages {
        trace!("stage `{}` for {}", name, sctx.file.path.display());
        if let Err(error) = stage(sctx) {
            sctx.file.fail_at(name, error.to_string());
        }
    }
}

/// Resolve a configured output target against the run's working directory.
pub(crate) fn absolute_target(cwd: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        cwd.join(target)
    }
}
