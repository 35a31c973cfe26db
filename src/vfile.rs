//! Virtual file representation used throughout the pipeline
//!
//! A [`VirtualFile`] carries a document's path, contents, and diagnostics
//! independently of whether it has been read from or will be written to disk.
//! Files are created by the finder (from disk), by the stdin reader (from a
//! stream), or injected programmatically before the run starts; every pipeline
//! stage mutates the same value and the diagnostics reporter consumes it at
//! the end.

use std::path::{Component, Path, PathBuf};

/// A diagnostic attached to a virtual file.
#[derive(Debug, Clone)]
pub struct Message {
    /// Human-readable description of the problem
    pub reason: String,
    /// Fatal messages mark the file as failed; later stages skip substantive
    /// work for it but still run
    pub fatal: bool,
    /// The stage or rule that produced the message, if known
    pub source: Option<String>,
}

impl Message {
    /// Create a non-fatal (warning) message.
    pub fn warning(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            fatal: false,
            source: None,
        }
    }

    /// Create a fatal message.
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            fatal: true,
            source: None,
        }
    }

    /// Attach the producing stage or rule name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Engine-internal flags carried on each file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileData {
    /// Was this file explicitly supplied by the user (vs. discovered or
    /// injected by a plugin)? Only given files are written out and reported.
    pub given: bool,
    /// Did the contents come from standard input?
    pub stream_in: bool,
}

/// One document under processing.
///
/// The `path` is kept relative to `cwd`. Renames push the old path onto
/// `history`; the first history entry (or the current path, if never renamed)
/// is the file's *origin* and serves as its identity inside a
/// [`FileSet`](crate::fileset::FileSet).
#[derive(Debug, Clone, Default)]
pub struct VirtualFile {
    /// Current path, relative to `cwd`
    pub path: PathBuf,
    /// Base directory all paths are relative to
    pub cwd: PathBuf,
    /// Prior paths, oldest first
    pub history: Vec<PathBuf>,
    /// File contents, if read or pre-filled
    pub contents: Option<String>,
    /// Engine-internal flags
    pub data: FileData,
    /// Diagnostics collected across the run
    pub messages: Vec<Message>,
    /// Whether the file has been written to disk
    pub stored: bool,
}

impl VirtualFile {
    /// Create a new virtual file at `path` (relative to `cwd`).
    pub fn new(path: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cwd: cwd.into(),
            ..Self::default()
        }
    }

    /// The file's original path, used as its identity within a file set.
    pub fn origin(&self) -> &Path {
        self.history.first().unwrap_or(&self.path)
    }

    /// Absolute path of the file on disk.
    pub fn absolute_path(&self) -> PathBuf {
        self.cwd.join(&self.path)
    }

    /// Rename the file, recording the old path in `history`.
    pub fn rename(&mut self, path: impl Into<PathBuf>) {
        let old = std::mem::replace(&mut self.path, path.into());
        self.history.push(old);
    }

    /// Replace the file's extension, recording the old path in `history`.
    ///
    /// No-op when the extension already matches.
    pub fn set_extension(&mut self, extension: &str) {
        if self.path.extension().and_then(|e| e.to_str()) == Some(extension) {
            return;
        }
        let mut new = self.path.clone();
        new.set_extension(extension);
        self.rename(new);
    }

    /// Move the file into `dirname`, keeping its file name.
    pub fn set_dirname(&mut self, dirname: &Path) {
        let name = self
            .path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default();
        self.rename(dirname.join(name));
    }

    /// Attach a non-fatal message.
    pub fn message(&mut self, reason: impl Into<String>) {
        self.messages.push(Message::warning(reason));
    }

    /// Attach a fatal message, marking the file as failed.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.messages.push(Message::fatal(reason));
    }

    /// Attach a fatal message tagged with the stage that produced it.
    pub fn fail_at(&mut self, source: &str, reason: impl Into<String>) {
        self.messages
            .push(Message::fatal(reason).with_source(source));
    }

    /// Whether any fatal message is attached.
    pub fn has_fatal(&self) -> bool {
        self.messages.iter().any(|m| m.fatal)
    }

    /// Whether any path component is hidden (leading dot) or `node_modules`.
    pub fn is_hidden(&self) -> bool {
        path_is_hidden(&self.path)
    }
}

/// True if any normal component of `path` starts with `.` or is
/// `node_modules`.
pub(crate) fn path_is_hidden(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(part) => {
            let part = part.to_string_lossy();
            part.starts_with('.') || part == "node_modules"
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_first_path() {
        let mut file = VirtualFile::new("a.md", "/tmp");
        assert_eq!(file.origin(), Path::new("a.md"));

        file.rename("b.md");
        file.rename("c.md");
        assert_eq!(file.origin(), Path::new("a.md"));
        assert_eq!(file.path, PathBuf::from("c.md"));
        assert_eq!(file.history, vec![PathBuf::from("a.md"), PathBuf::from("b.md")]);
    }

    #[test]
    fn test_set_extension_records_history() {
        let mut file = VirtualFile::new("doc.md", "/tmp");
        file.set_extension("json");
        assert_eq!(file.path, PathBuf::from("doc.json"));
        assert_eq!(file.origin(), Path::new("doc.md"));
    }

    #[test]
    fn test_set_extension_same_is_noop() {
        let mut file = VirtualFile::new("doc.md", "/tmp");
        file.set_extension("md");
        assert_eq!(file.path, PathBuf::from("doc.md"));
        assert!(file.history.is_empty());
    }

    #[test]
    fn test_set_dirname() {
        let mut file = VirtualFile::new("src/doc.md", "/tmp");
        file.set_dirname(Path::new("out"));
        assert_eq!(file.path, PathBuf::from("out/doc.md"));
    }

    #[test]
    fn test_fatal_messages() {
        let mut file = VirtualFile::new("a.md", "/tmp");
        assert!(!file.has_fatal());

        file.message("minor nit");
        assert!(!file.has_fatal());

        file.fail_at("read", "boom");
        assert!(file.has_fatal());
        assert_eq!(file.messages.len(), 2);
        assert_eq!(file.messages[1].source.as_deref(), Some("read"));
    }

    #[test]
    fn test_hidden_paths() {
        assert!(path_is_hidden(Path::new(".git/config")));
        assert!(path_is_hidden(Path::new("a/.hidden/b.md")));
        assert!(path_is_hidden(Path::new("node_modules/pkg/index.md")));
        assert!(!path_is_hidden(Path::new("src/a.md")));
    }

    #[test]
    fn test_absolute_path() {
        let file = VirtualFile::new("src/a.md", "/work");
        assert_eq!(file.absolute_path(), PathBuf::from("/work/src/a.md"));
    }
}
