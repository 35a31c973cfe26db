//! File discovery: expanding CLI patterns into a concrete file list
//!
//! The finder turns glob patterns and literal paths into a deduplicated,
//! alphabetically sorted list of virtual files. Bad explicit arguments are
//! reported per-file (a missing literal path becomes a file entry carrying a
//! fatal message) rather than aborting the whole batch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::Result;
use crate::ignore::Ignore;
use crate::vfile::VirtualFile;

/// Outcome of a discovery pass.
#[derive(Debug)]
pub struct FindResult {
    /// Discovered files, sorted by absolute path, each marked as given
    pub files: Vec<VirtualFile>,
    /// Exactly one literal (non-glob) regular file was supplied; output may
    /// target a single destination path instead of a directory
    pub one_file_mode: bool,
}

/// Expands patterns against the filesystem, honoring the ignore predicate.
pub struct Finder<'a> {
    cwd: &'a Path,
    extensions: &'a [String],
    ignore: &'a Ignore,
    silently_ignore: bool,
}

impl<'a> Finder<'a> {
    pub fn new(
        cwd: &'a Path,
        extensions: &'a [String],
        ignore: &'a Ignore,
        silently_ignore: bool,
    ) -> Self {
        Self {
            cwd,
            extensions,
            ignore,
            silently_ignore,
        }
    }

    /// Expand `patterns` into a concrete file list.
    ///
    /// Patterns containing glob magic are matched against the filesystem;
    /// everything else is treated as a literal path. Directories are walked
    /// recursively with the ignore predicate applied per entry.
    pub fn find(&self, patterns: &[String]) -> Result<FindResult> {
        // Keyed by absolute path: deduplicates and keeps results sorted.
        let mut found: BTreeMap<PathBuf, VirtualFile> = BTreeMap::new();
        let mut literal_files = 0usize;
        let mut saw_glob = false;

        for pattern in patterns {
            if is_glob(pattern) {
                saw_glob = true;
                self.expand_glob(pattern, &mut found)?;
            } else {
                self.add_literal(pattern, &mut found, &mut literal_files)?;
            }
        }

        let one_file_mode = !saw_glob && literal_files == 1 && found.len() == 1;
        debug!(
            "finder: {} file(s), one-file mode: {}",
            found.len(),
            one_file_mode
        );

        Ok(FindResult {
            files: found.into_values().collect(),
            one_file_mode,
        })
    }

    /// Handle one literal path argument.
    fn add_literal(
        &self,
        given: &str,
        found: &mut BTreeMap<PathBuf, VirtualFile>,
        literal_files: &mut usize,
    ) -> Result<()> {
        let absolute = self.cwd.join(given);

        let Ok(metadata) = std::fs::metadata(&absolute) else {
            // Partial-failure semantics: report on the file, keep the batch.
            let mut file = self.make_file(&absolute);
            file.fail("No such file or directory");
            found.insert(absolute, file);
            return Ok(());
        };

        if metadata.is_dir() {
            self.walk(&absolute, found)?;
            return Ok(());
        }

        *literal_files += 1;

        if self.ignore.check(&absolute) {
            if self.silently_ignore {
                debug!("silently skipping ignored file {}", absolute.display());
                return Ok(());
            }
            let mut file = self.make_file(&absolute);
            file.fail("Cannot process specified file: it is ignored");
            found.insert(absolute, file);
            return Ok(());
        }

        found.insert(absolute.clone(), self.make_file(&absolute));
        Ok(())
    }

    /// Expand one glob pattern against the filesystem.
    fn expand_glob(&self, pattern: &str, found: &mut BTreeMap<PathBuf, VirtualFile>) -> Result<()> {
        let anchored = self.cwd.join(pattern);
        for entry in glob::glob(&anchored.to_string_lossy())? {
            let Ok(path) = entry else { continue };
            let Ok(metadata) = std::fs::metadata(&path) else {
                continue;
            };
            if metadata.is_dir() {
                self.walk(&path, found)?;
            } else if !self.ignore.check(&path) {
                // Glob-matched files are included whatever their extension.
                found.insert(path.clone(), self.make_file(&path));
            }
        }
        Ok(())
    }

    /// Recursively walk a directory, applying the ignore predicate.
    ///
    /// Ignored directories are skipped outright unless negated patterns
    /// exist, in which case the walk descends and every file is tested
    /// individually (a deeper negation can re-include it).
    fn walk(&self, directory: &Path, found: &mut BTreeMap<PathBuf, VirtualFile>) -> Result<()> {
        let negations = self.ignore.negations();
        let walker = WalkDir::new(directory).into_iter().filter_entry(|entry| {
            if entry.file_type().is_dir() {
                negations || !self.ignore.check(entry.path())
            } else {
                true
            }
        });

        for entry in walker {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if self.ignore.check(path) {
                continue;
            }
            if self.has_known_extension(path) {
                found.insert(path.to_path_buf(), self.make_file(path));
            }
        }
        Ok(())
    }

    fn has_known_extension(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|known| known == extension)
    }

    fn make_file(&self, absolute: &Path) -> VirtualFile {
        let relative = absolute.strip_prefix(self.cwd).unwrap_or(absolute);
        let mut file = VirtualFile::new(relative, self.cwd);
        file.data.given = true;
        file
    }
}

/// True when the pattern contains glob magic characters.
fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}
