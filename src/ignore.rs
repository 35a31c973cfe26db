//! Ignore-file loading and path classification
//!
//! Patterns are line-oriented globs: `#` starts a comment line, blank lines
//! are skipped, and a leading `!` negates a pattern. Classification is a
//! left-to-right fold, *not* gitignore semantics: the state starts at the
//! hidden-file default (any dot-prefixed segment or `node_modules` is
//! ignored), and every matching pattern sets the state to its own polarity,
//! so the last matching pattern wins.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::debug;

use crate::error::{Error, Result};
use crate::vfile::path_is_hidden;

/// One parsed ignore pattern.
#[derive(Debug, Clone)]
struct IgnorePattern {
    /// Compiled glob for the pattern as written
    pattern: Pattern,
    /// Compiled glob for `pattern + "/**"` so a directory pattern also
    /// covers everything inside it
    dir_pattern: Pattern,
    /// Leading `!` strips the ignore instead of applying it
    negated: bool,
}

/// How to locate the ignore file.
#[derive(Debug, Clone, Default)]
pub struct IgnoreOptions {
    /// Explicit ignore file; missing file is a hard error
    pub ignore_path: Option<PathBuf>,
    /// Search upward from `cwd` for a file with this name
    pub ignore_name: Option<String>,
    /// Whether to perform the upward search at all
    pub detect_ignore: bool,
}

/// Resolved ignore patterns plus the classification predicate.
///
/// Loaded once per run; immutable afterwards.
#[derive(Debug)]
pub struct Ignore {
    patterns: Vec<IgnorePattern>,
    /// File the patterns came from, if any
    pub source: Option<PathBuf>,
    cwd: PathBuf,
}

impl Ignore {
    /// Load ignore patterns according to `options`.
    ///
    /// An explicit `ignore_path` must exist; a detected ignore file is
    /// optional and absence yields an empty pattern set.
    pub fn load(cwd: &Path, options: &IgnoreOptions) -> Result<Self> {
        if let Some(explicit) = &options.ignore_path {
            let path = cwd.join(explicit);
            let text = fs::read_to_string(&path).map_err(|e| Error::Ignore {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            return Ok(Self {
                patterns: parse_patterns(&text)?,
                source: Some(path),
                cwd: cwd.to_path_buf(),
            });
        }

        if options.detect_ignore {
            if let Some(name) = &options.ignore_name {
                if let Some(found) = search_upward(cwd, name) {
                    debug!("using detected ignore file at {}", found.display());
                    let text = fs::read_to_string(&found).map_err(|e| Error::Ignore {
                        path: found.display().to_string(),
                        message: e.to_string(),
                    })?;
                    return Ok(Self {
                        patterns: parse_patterns(&text)?,
                        source: Some(found),
                        cwd: cwd.to_path_buf(),
                    });
                }
            }
        }

        Ok(Self {
            patterns: Vec::new(),
            source: None,
            cwd: cwd.to_path_buf(),
        })
    }

    /// Build directly from pattern lines (used by tests and embedders).
    pub fn from_patterns(cwd: &Path, lines: &str) -> Result<Self> {
        Ok(Self {
            patterns: parse_patterns(lines)?,
            source: None,
            cwd: cwd.to_path_buf(),
        })
    }

    /// Classify a path. `path` may be absolute or relative to `cwd`.
    pub fn check(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.cwd).unwrap_or(path);
        let text = relative.to_string_lossy();

        // Hidden-file default, then each matching pattern flips the state
        // to its own polarity. Last match wins.
        let mut ignored = path_is_hidden(relative);
        for pattern in &self.patterns {
            if pattern.pattern.matches_with(&text, match_options())
                || pattern.dir_pattern.matches_with(&text, match_options())
            {
                ignored = !pattern.negated;
            }
        }
        ignored
    }

    /// Whether any pattern is negated.
    ///
    /// The finder uses this to keep descending into directories that are
    /// ignored at the top, since a deeper negated pattern could re-include
    /// files inside them.
    pub fn negations(&self) -> bool {
        self.patterns.iter().any(|p| p.negated)
    }

    /// Number of loaded patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no patterns are loaded.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        // `*` must not cross directory separators
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

/// Parse line-oriented ignore patterns.
fn parse_patterns(text: &str) -> Result<Vec<IgnorePattern>> {
    let mut patterns = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (negated, raw) = match line.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, line),
        };
        patterns.push(IgnorePattern {
            pattern: Pattern::new(raw)?,
            dir_pattern: Pattern::new(&format!("{}/**", raw.trim_end_matches('/')))?,
            negated,
        });
    }
    Ok(patterns)
}

/// Find the first file named `name` in `start` or any ancestor directory.
fn search_upward(start: &Path, name: &str) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}
