//! # Engine Orchestration
//!
//! The engine ties the subsystems together into one run:
//!
//! 1. Validate the invocation (setup errors abort before any file is
//!    touched).
//! 2. Load ignore patterns and discover files (pre-injected files bypass
//!    discovery but are still ignore-checked).
//! 3. Fall back to reading standard input into a single file when nothing
//!    was discovered and a stream was supplied.
//! 4. Drive every file through the front half of the stage pipeline, fire
//!    the file-set barrier exactly once when all files are queued, then run
//!    the back half.
//! 5. Write the consolidated diagnostics report and compute the exit code.
//!
//! Per-file errors become fatal messages on the affected file and never
//! abort the batch; only setup errors surface as `Err` from [`run`].

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::configuration::{ConfigResolver, ConfigTransform, OutputTarget, ResolverOptions};
use crate::error::{Error, Result};
use crate::fileset::FileSet;
use crate::finder::Finder;
use crate::ignore::{Ignore, IgnoreOptions};
use crate::plugin::{Plugin, PluginLoader, Registry, SetPlugin};
use crate::processor::{Processor, Settings};
use crate::report::{self, ReportOptions};
use crate::stages::{self, Context, RunState, StageCtx};
use crate::vfile::VirtualFile;

/// One input to the run: a pattern to expand, or a pre-built file.
pub enum Input {
    /// Glob pattern or literal path, expanded by the finder
    Pattern(String),
    /// Pre-built file; bypasses discovery but is still ignore-checked
    File(VirtualFile),
}

/// The full external interface of the engine.
///
/// Construct with [`Options::new`] and set fields as needed; everything but
/// the processor has a usable default.
pub struct Options {
    /// The parser/stringifier pair driving the run
    pub processor: Box<dyn Processor>,
    /// Working directory; defaults to the process working directory
    pub cwd: Option<PathBuf>,
    /// Patterns and pre-built files to process
    pub files: Vec<Input>,
    /// Extensions included when walking directories
    pub extensions: Vec<String>,
    /// Name for the stdin-backed file; conflicts with real files
    pub file_path: Option<PathBuf>,
    /// Standard-input stream, consumed when no files were found
    pub stream_in: Option<Box<dyn Read>>,
    /// Output stream; defaults to stdout
    pub stream_out: Option<Box<dyn Write>>,
    /// Error stream for the report; defaults to stderr
    pub stream_err: Option<Box<dyn Write>>,
    /// Output target, merged into configuration at highest precedence
    pub output: Option<OutputTarget>,
    /// Write serialized contents to the output stream (single-file runs)
    pub out: bool,
    /// Stringify even when no output was requested
    pub always_stringify: bool,
    /// Shorthand enabling both `tree_in` and `tree_out`
    pub tree: bool,
    pub tree_in: Option<bool>,
    pub tree_out: Option<bool>,
    /// Whether to search the directory tree for rc files
    pub detect_config: bool,
    pub rc_name: Option<String>,
    pub rc_path: Option<PathBuf>,
    pub package_field: Option<String>,
    /// Invocation-level processor settings
    pub settings: Settings,
    /// Fragment rewrite hook
    pub config_transform: Option<ConfigTransform>,
    /// Whether to search for an ignore file
    pub detect_ignore: bool,
    pub ignore_name: Option<String>,
    pub ignore_path: Option<PathBuf>,
    /// Drop ignored explicit files instead of flagging them
    pub silently_ignore: bool,
    /// Prefix for the default registry when no loader is supplied
    pub plugin_prefix: Option<String>,
    /// Invocation-level plugins by name, with optional options
    pub plugins: Vec<(String, Option<Value>)>,
    /// Plugins attached directly, without going through the loader
    pub injected_plugins: Vec<(Arc<dyn Plugin>, Value)>,
    /// File-set-level plugins attached up front
    pub set_plugins: Vec<Arc<dyn SetPlugin>>,
    pub preset_prefix: Option<String>,
    /// Invocation-level presets by name
    pub presets: Vec<String>,
    /// Plugin loader; defaults to an empty registry
    pub loader: Option<Arc<dyn PluginLoader>>,
    /// Report colors
    pub color: bool,
    /// Report only fatal messages
    pub silent: bool,
    /// Report only files with messages
    pub quiet: bool,
    /// Any message fails the run
    pub frail: bool,
}

impl Options {
    pub fn new(processor: Box<dyn Processor>) -> Self {
        Self {
            processor,
            cwd: None,
            files: Vec::new(),
            extensions: Vec::new(),
            file_path: None,
            stream_in: None,
            stream_out: None,
            stream_err: None,
            output: None,
            out: false,
            always_stringify: false,
            tree: false,
            tree_in: None,
            tree_out: None,
            detect_config: false,
            rc_name: None,
            rc_path: None,
            package_field: None,
            settings: Settings::new(),
            config_transform: None,
            detect_ignore: false,
            ignore_name: None,
            ignore_path: None,
            silently_ignore: false,
            plugin_prefix: None,
            plugins: Vec::new(),
            injected_plugins: Vec::new(),
            set_plugins: Vec::new(),
            preset_prefix: None,
            presets: Vec::new(),
            loader: None,
            color: false,
            silent: false,
            quiet: false,
            frail: false,
        }
    }
}

/// Outcome of a run.
#[derive(Debug)]
pub struct RunResult {
    /// `0` on success, `1` when any given file failed (or, under `frail`,
    /// carried any message)
    pub exit_code: i32,
    /// Every file that went through the pipeline
    pub files: Vec<VirtualFile>,
}

/// Process all files described by `options`.
pub fn run(mut options: Options) -> Result<RunResult> {
    let cwd = match options.cwd.take() {
        Some(cwd) => cwd,
        None => std::env::current_dir()?,
    };

    validate(&options)?;

    let tree_in = options.tree_in.unwrap_or(options.tree);
    let tree_out = options.tree_out.unwrap_or(options.tree);

    let ignore = Ignore::load(
        &cwd,
        &IgnoreOptions {
            ignore_path: options.ignore_path.take(),
            ignore_name: options.ignore_name.take(),
            detect_ignore: options.detect_ignore,
        },
    )?;

    // Split inputs: patterns go through the finder, pre-built files bypass
    // discovery but are still ignore-checked.
    let mut patterns = Vec::new();
    let mut files = Vec::new();
    for input in options.files.drain(..) {
        match input {
            Input::Pattern(pattern) => patterns.push(pattern),
            Input::File(mut file) => {
                file.data.given = true;
                if ignore.check(&file.absolute_path()) {
                    if options.silently_ignore {
                        continue;
                    }
                    file.fail("Cannot process specified file: it is ignored");
                }
                files.push(file);
            }
        }
    }

    let mut one_file_mode = false;
    if !patterns.is_empty() {
        let finder = Finder::new(&cwd, &options.extensions, &ignore, options.silently_ignore);
        let found = finder.find(&patterns)?;
        one_file_mode = found.one_file_mode && files.is_empty();
        files.extend(found.files);
    }

    if !files.is_empty() && options.file_path.is_some() {
        return Err(Error::setup(
            "Do not pass both `file_path` and real files: the intent is ambiguous",
        ));
    }

    // Standard-input fallback.
    if files.is_empty() {
        if let Some(mut stream) = options.stream_in.take() {
            let mut contents = String::new();
            stream.read_to_string(&mut contents)?;
            let path = options
                .file_path
                .take()
                .unwrap_or_else(|| PathBuf::from("<stdin>"));
            let mut file = VirtualFile::new(path, &cwd);
            file.contents = Some(contents);
            file.data.given = true;
            file.data.stream_in = true;
            files.push(file);
            one_file_mode = true;
        }
    }

    let file_count = files.len();
    debug!("engine: processing {} file(s)", file_count);

    let loader = options.loader.take().unwrap_or_else(|| {
        let mut registry = Registry::new();
        if let Some(prefix) = &options.plugin_prefix {
            registry = registry.with_prefix(prefix.clone());
        }
        Arc::new(registry)
    });

    let mut resolver = ConfigResolver::new(
        &cwd,
        ResolverOptions {
            detect_config: options.detect_config,
            rc_name: options.rc_name.take(),
            rc_path: options.rc_path.take(),
            package_field: options.package_field.take(),
            settings: std::mem::take(&mut options.settings),
            plugins: std::mem::take(&mut options.plugins),
            presets: std::mem::take(&mut options.presets),
            output: options.output.take(),
            preset_prefix: options.preset_prefix.take(),
            config_transform: options.config_transform.take(),
        },
        loader.clone(),
    );

    let mut set = FileSet::new();
    for file in files {
        set.add(file);
    }
    for plugin in options.set_plugins.drain(..) {
        set.use_plugin(plugin);
    }

    let mut stream_out = options
        .stream_out
        .take()
        .unwrap_or_else(|| Box::new(io::stdout()));
    let mut stream_err = options
        .stream_err
        .take()
        .unwrap_or_else(|| Box::new(io::stderr()));

    let run_state = RunState {
        processor: &*options.processor,
        tree_in,
        tree_out,
        out: options.out,
        always_stringify: options.always_stringify,
        file_count: if one_file_mode { 1 } else { file_count },
        cwd: &cwd,
        injected: &options.injected_plugins,
    };

    let mut contexts: Vec<Context> = Vec::new();
    let mut processed = 0;

    // Front half, then the barrier. Set-level plugins may add files, which
    // also get their front half before the back half starts; the barrier
    // itself never fires twice.
    loop {
        while processed < set.len() {
            if contexts.len() < set.len() {
                contexts.resize_with(set.len(), Context::default);
            }
            let mut file = set.take_file(processed);
            let mut sctx = StageCtx {
                run: &run_state,
                file: &mut file,
                ctx: &mut contexts[processed],
                set: &mut set,
                resolver: &mut resolver,
                loader: &*loader,
                stream_out: &mut *stream_out,
            };
            stages::run_stages(stages::FRONT, &mut sctx);
            set.put_file(processed, file);
            processed += 1;
        }

        if set.should_fire() {
            if let Err(error) = set.fire() {
                // A failed file-set pipeline fails every queued file. Files
                // added during the flush never reached the barrier and keep
                // their own diagnostics.
                let reason = error.to_string();
                for index in 0..set.len() {
                    if set.is_queued(set.files()[index].origin()) {
                        set.files_mut()[index].fail_at("file-set", reason.clone());
                    }
                }
            }
            if processed < set.len() {
                continue;
            }
        }
        break;
    }

    // Back half.
    if contexts.len() < set.len() {
        contexts.resize_with(set.len(), Context::default);
    }
    for index in 0..set.len() {
        let mut file = set.take_file(index);
        let mut sctx = StageCtx {
            run: &run_state,
            file: &mut file,
            ctx: &mut contexts[index],
            set: &mut set,
            resolver: &mut resolver,
            loader: &*loader,
            stream_out: &mut *stream_out,
        };
        stages::run_stages(stages::BACK, &mut sctx);
        set.put_file(index, file);
        set.complete_one();
    }
    debug_assert!(set.is_done());

    let files = set.into_files();
    let report_options = ReportOptions {
        quiet: options.quiet,
        silent: options.silent,
        frail: options.frail,
        use_color: options.color,
    };
    report::write_report(&files, &report_options, &mut stream_err)?;

    Ok(RunResult {
        exit_code: report::exit_code(&files, options.frail),
        files,
    })
}

/// Reject invalid invocations before any file is touched.
fn validate(options: &Options) -> Result<()> {
    if options.output.is_some() && options.out {
        return Err(Error::setup(
            "Cannot accept both `output` and `out`: pick a filesystem or stream destination",
        ));
    }
    if options.detect_config && options.rc_name.is_none() && options.package_field.is_none() {
        return Err(Error::setup(
            "Missing `rc_name` or `package_field` with `detect_config`",
        ));
    }
    if options.detect_ignore && options.ignore_name.is_none() {
        return Err(Error::setup("Missing `ignore_name` with `detect_ignore`"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::TextProcessor;

    fn options() -> Options {
        Options::new(Box::new(TextProcessor))
    }

    fn injected(name: &str, contents: &str) -> Input {
        let mut file = VirtualFile::new(name, ".");
        file.contents = Some(contents.to_string());
        Input::File(file)
    }

    #[test]
    fn test_setup_error_output_and_out() {
        let mut opts = options();
        opts.output = Some(OutputTarget::WriteBack);
        opts.out = true;
        assert!(matches!(run(opts), Err(Error::Setup { .. })));
    }

    #[test]
    fn test_setup_error_detect_config_without_names() {
        let mut opts = options();
        opts.detect_config = true;
        assert!(matches!(run(opts), Err(Error::Setup { .. })));
    }

    #[test]
    fn test_setup_error_detect_ignore_without_name() {
        let mut opts = options();
        opts.detect_ignore = true;
        assert!(matches!(run(opts), Err(Error::Setup { .. })));
    }

    #[test]
    fn test_setup_error_file_path_with_real_files() {
        let mut opts = options();
        opts.file_path = Some(PathBuf::from("name.txt"));
        opts.files.push(injected("a.txt", "hi\n"));
        assert!(matches!(run(opts), Err(Error::Setup { .. })));
    }

    #[test]
    fn test_injected_file_clean_run() {
        let mut opts = options();
        opts.files.push(injected("a.txt", "hi\n"));
        opts.stream_err = Some(Box::new(Vec::new()));
        let result = run(opts).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].data.given);
    }

    #[test]
    fn test_stdin_fallback_names_file() {
        let mut opts = options();
        opts.stream_in = Some(Box::new(io::Cursor::new("from stdin\n")));
        opts.file_path = Some(PathBuf::from("piped.txt"));
        opts.stream_err = Some(Box::new(Vec::new()));
        let result = run(opts).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].path, PathBuf::from("piped.txt"));
        assert!(result.files[0].data.stream_in);
        assert_eq!(result.files[0].contents.as_deref(), Some("from stdin\n"));
    }

    struct AddThenFail;

    impl SetPlugin for AddThenFail {
        fn id(&self) -> &str {
            "add-then-fail"
        }

        fn run(&self, set: &mut FileSet) -> Result<()> {
            let mut file = VirtualFile::new("late.txt", ".");
            file.contents = Some("late\n".to_string());
            set.add(file);
            Err(Error::Plugin {
                id: "add-then-fail".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    #[test]
    fn test_set_plugin_failure_spares_files_added_mid_flush() {
        let mut opts = options();
        opts.files.push(injected("a.txt", "hi\n"));
        opts.set_plugins.push(Arc::new(AddThenFail));
        opts.stream_err = Some(Box::new(Vec::new()));

        let result = run(opts).unwrap();
        assert_eq!(result.exit_code, 1);

        let original = result
            .files
            .iter()
            .find(|f| f.path == PathBuf::from("a.txt"))
            .unwrap();
        assert!(original.has_fatal());
        assert_eq!(original.messages[0].source.as_deref(), Some("file-set"));

        let late = result
            .files
            .iter()
            .find(|f| f.path == PathBuf::from("late.txt"))
            .unwrap();
        assert!(!late.has_fatal());
    }

    #[test]
    fn test_out_writes_single_file_to_stream() {
        let mut opts = options();
        opts.files.push(injected("a.txt", "hello\n"));
        opts.out = true;
        opts.stream_out = Some(Box::new(Vec::new()));
        opts.stream_err = Some(Box::new(Vec::new()));
        // The captured stream is consumed by the run; verify via exit code
        // and stored contents instead.
        let result = run(opts).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.files[0].contents.as_deref(), Some("hello\n"));
    }
}
