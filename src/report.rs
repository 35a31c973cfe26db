//! # Diagnostics Report
//!
//! Renders one consolidated report for all user-supplied files at the end
//! of a run, and computes the batch exit code. Color handling respects the
//! `--color` flag and the usual environment variables (`NO_COLOR`,
//! `CLICOLOR`, `CLICOLOR_FORCE`, `TERM=dumb`), detected through the
//! `console` crate.
//!
//! Filtering:
//! - `quiet` hides files without messages.
//! - `silent` additionally hides non-fatal messages.
//!
//! When nothing passes the filters the report is empty and nothing is
//! written at all.

use std::env;
use std::io::{self, Write};

use console::Style;

use crate::vfile::VirtualFile;

/// How the report is filtered and painted.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Hide files without messages
    pub quiet: bool,
    /// Hide non-fatal messages (implies `quiet` for unaffected files)
    pub silent: bool,
    /// Treat any message as failure when computing the exit code
    pub frail: bool,
    /// Whether to emit ANSI colors
    pub use_color: bool,
}

/// Detect whether color output should be used.
///
/// # Behavior
/// - `always`: force colors on (overrides `NO_COLOR`)
/// - `never`: force colors off
/// - anything else: detect based on environment and TTY
pub fn color_choice(color_flag: &str) -> bool {
    match color_flag.to_lowercase().as_str() {
        "always" => true,
        "never" => false,
        _ => detect_color_support(),
    }
}

fn detect_color_support() -> bool {
    // The presence of NO_COLOR (even empty) disables colors
    // (https://no-color.org/).
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return false;
    }
    if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
        return true;
    }
    if env::var("TERM").is_ok_and(|v| v == "dumb") {
        return false;
    }
    console::Term::stderr().features().colors_supported()
}

/// Compute the run's exit code from the given files.
///
/// `1` when any given file carries a fatal message, or, under `frail`, any
/// message at all.
pub fn exit_code(files: &[VirtualFile], frail: bool) -> i32 {
    let failed = files.iter().filter(|f| f.data.given).any(|file| {
        if frail {
            !file.messages.is_empty()
        } else {
            file.has_fatal()
        }
    });
    i32::from(failed)
}

/// Render the report as a string. Empty when there is nothing to show.
pub fn render(files: &[VirtualFile], options: &ReportOptions) -> String {
    let mut out = String::new();
    let mut total = 0usize;
    let mut fatal = 0usize;

    for file in files.iter().filter(|f| f.data.given) {
        let visible: Vec<_> = file
            .messages
            .iter()
            .filter(|m| m.fatal || !options.silent)
            .collect();

        if visible.is_empty() {
            if !(options.quiet || options.silent) {
                out.push_str(&format!(
                    "{}: {}\n",
                    paint(options, Style::new().underlined(), &display_path(file)),
                    paint(options, Style::new().green(), "no issues found"),
                ));
            }
            continue;
        }

        out.push_str(&format!(
            "{}\n",
            paint(options, Style::new().underlined(), &display_path(file))
        ));
        for message in visible {
            total += 1;
            let label = if message.fatal {
                fatal += 1;
                paint(options, Style::new().red().bold(), "error")
            } else {
                paint(options, Style::new().yellow(), "warning")
            };
            let source = message
                .source
                .as_deref()
                .map(|s| format!(" ({})", s))
                .unwrap_or_default();
            out.push_str(&format!("  {} {}{}\n", label, message.reason, source));
        }
        out.push('\n');
    }

    if total > 0 {
        out.push_str(&format!(
            "{} message{} ({} fatal)\n",
            total,
            if total == 1 { "" } else { "s" },
            fatal
        ));
    }
    out
}

/// Write the rendered report to `stream`; writes nothing when empty.
pub fn write_report(
    files: &[VirtualFile],
    options: &ReportOptions,
    stream: &mut dyn Write,
) -> io::Result<()> {
    let rendered = render(files, options);
    if !rendered.is_empty() {
        stream.write_all(rendered.as_bytes())?;
        stream.flush()?;
    }
    Ok(())
}

fn display_path(file: &VirtualFile) -> String {
    file.path.display().to_string()
}

fn paint(options: &ReportOptions, style: Style, text: &str) -> String {
    if options.use_color {
        style.force_styling(true).apply_to(text).to_string()
    } else {
        text.to_string()
    }
}
