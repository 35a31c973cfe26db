//! Process command implementation
//!
//! The process command runs the full engine pipeline: discover files from
//! the given patterns (or standard input), resolve layered configuration,
//! run every file through the stage pipeline, and print the diagnostics
//! report. The built-in text processor and plugins are registered so the
//! binary is useful without embedding code.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use clap::Args;
use serde_json::Value;

use textmill::configuration::OutputTarget;
use textmill::engine::{self, Input, Options};
use textmill::plugin::{builtin, Registry};
use textmill::processor::TextProcessor;
use textmill::report;

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Files, directories, or glob patterns to process
    pub patterns: Vec<String>,

    /// File extensions included when walking directories
    #[arg(long = "ext", value_name = "EXT", default_value = "txt")]
    pub extensions: Vec<String>,

    /// Write files back in place, or into PATH when given
    #[arg(short = 'o', long, value_name = "PATH", num_args = 0..=1)]
    pub output: Option<Option<PathBuf>>,

    /// Write the processed file to standard output (single-file runs)
    #[arg(long)]
    pub stdout: bool,

    /// Shorthand for --tree-in plus --tree-out
    #[arg(long)]
    pub tree: bool,

    /// Read input as a serialized syntax tree (JSON)
    #[arg(long)]
    pub tree_in: bool,

    /// Write output as a serialized syntax tree (JSON)
    #[arg(long)]
    pub tree_out: bool,

    /// Disable rc-file detection
    #[arg(long)]
    pub no_config: bool,

    /// Base name of rc files searched for
    #[arg(long, value_name = "NAME", default_value = ".textmillrc")]
    pub rc_name: String,

    /// Explicit configuration file
    #[arg(long, value_name = "PATH")]
    pub rc_path: Option<PathBuf>,

    /// package.json member to read configuration from
    #[arg(long, value_name = "FIELD")]
    pub package_field: Option<String>,

    /// Disable ignore-file detection
    #[arg(long)]
    pub no_ignore: bool,

    /// Name of ignore files searched for
    #[arg(long, value_name = "NAME", default_value = ".textmillignore")]
    pub ignore_name: String,

    /// Explicit ignore file
    #[arg(long, value_name = "PATH")]
    pub ignore_path: Option<PathBuf>,

    /// Drop ignored explicit files instead of flagging them
    #[arg(long)]
    pub silently_ignore: bool,

    /// Attach a plugin: NAME or NAME=JSON-OPTIONS
    #[arg(long = "use", value_name = "PLUGIN")]
    pub plugins: Vec<String>,

    /// Apply a preset by name
    #[arg(long = "preset", value_name = "NAME")]
    pub presets: Vec<String>,

    /// Set a processor setting: KEY=JSON-VALUE
    #[arg(long = "setting", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Path to report for standard-input contents
    #[arg(long, value_name = "PATH")]
    pub file_path: Option<PathBuf>,

    /// Only report files with messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Only report fatal messages
    #[arg(long)]
    pub silent: bool,

    /// Treat any message as failure
    #[arg(long)]
    pub frail: bool,
}

/// Execute the process command
pub fn execute(args: ProcessArgs, color_flag: &str) -> Result<()> {
    let mut registry = Registry::new().with_prefix("textmill");
    builtin::register_all(&mut registry, "textmill");

    let mut options = Options::new(Box::new(TextProcessor));
    options.extensions = args.extensions;
    options.out = args.stdout;
    options.tree = args.tree;
    if args.tree_in {
        options.tree_in = Some(true);
    }
    if args.tree_out {
        options.tree_out = Some(true);
    }
    options.detect_config = !args.no_config;
    options.rc_name = Some(args.rc_name);
    options.rc_path = args.rc_path;
    options.package_field = args.package_field;
    options.detect_ignore = !args.no_ignore;
    options.ignore_name = Some(args.ignore_name);
    options.ignore_path = args.ignore_path;
    options.silently_ignore = args.silently_ignore;
    options.plugin_prefix = Some("textmill".to_string());
    options.preset_prefix = Some("textmill".to_string());
    options.file_path = args.file_path;
    options.quiet = args.quiet;
    options.silent = args.silent;
    options.frail = args.frail;
    options.color = report::color_choice(color_flag);
    options.loader = Some(Arc::new(registry));

    options.output = match args.output {
        None => None,
        Some(None) => Some(OutputTarget::WriteBack),
        Some(Some(path)) => Some(OutputTarget::Path(path)),
    };

    for spec in &args.plugins {
        options.plugins.push(parse_plugin_spec(spec)?);
    }
    options.presets = args.presets;

    for entry in &args.settings {
        let (key, value) = parse_setting(entry)?;
        options.settings.insert(key, value);
    }

    options.files = args
        .patterns
        .into_iter()
        .map(Input::Pattern)
        .collect();

    // Pipe detection: only consume stdin when nothing else was given.
    if options.files.is_empty() && !io::stdin().is_terminal() {
        options.stream_in = Some(Box::new(io::stdin()));
    }

    let result = engine::run(options)?;
    if result.exit_code != 0 {
        std::process::exit(result.exit_code);
    }
    Ok(())
}

/// Parse `NAME` or `NAME=JSON-OPTIONS` plugin specs.
fn parse_plugin_spec(spec: &str) -> Result<(String, Option<Value>)> {
    match spec.split_once('=') {
        None => Ok((spec.to_string(), None)),
        Some((name, options)) => {
            let value: Value = serde_json::from_str(options)
                .with_context(|| format!("invalid options for plugin `{}`", name))?;
            Ok((name.to_string(), Some(value)))
        }
    }
}

/// Parse `KEY=VALUE` settings; the value is JSON, falling back to a string.
fn parse_setting(entry: &str) -> Result<(String, Value)> {
    let (key, value) = entry
        .split_once('=')
        .ok_or_else(|| anyhow!("settings must be KEY=VALUE, got `{}`", entry))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
