//! File-set bookkeeping and the queue barrier
//!
//! A [`FileSet`] owns every virtual file in a run, deduplicated by origin
//! identity. It tracks how many files are expected vs. finished, which files
//! have reached the `queue` stage, and the set-level plugins that must run
//! exactly once after all currently-known files are queued. Rather than an
//! implicit event bus, the barrier is an explicit queued-origin set checked
//! synchronously by the engine.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::plugin::SetPlugin;
use crate::vfile::VirtualFile;

/// The collection of files under processing, plus the completion barrier.
#[derive(Default)]
pub struct FileSet {
    files: Vec<VirtualFile>,
    /// Origin identities, used to deduplicate added files
    origins: HashSet<PathBuf>,
    /// Files registered for processing
    expected: usize,
    /// Files that finished the whole per-file pipeline
    actual: usize,
    /// Origins that reached the queue stage (the barrier map)
    queued: HashSet<PathBuf>,
    /// Set-level plugins, deduplicated by id
    plugins: Vec<Arc<dyn SetPlugin>>,
    plugin_ids: HashSet<String>,
    /// Whether the set-level plugins already ran this run
    fired: bool,
}

impl std::fmt::Debug for FileSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSet")
            .field("files", &self.files.len())
            .field("expected", &self.expected)
            .field("actual", &self.actual)
            .field("queued", &self.queued.len())
            .field("plugins", &self.plugins.len())
            .field("fired", &self.fired)
            .finish()
    }
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file for processing.
    ///
    /// Files are deduplicated by origin identity: adding a file whose origin
    /// is already known is a no-op. Returns whether the file was added.
    pub fn add(&mut self, file: VirtualFile) -> bool {
        let origin = file.origin().to_path_buf();
        if !self.origins.insert(origin) {
            debug!("file set: duplicate origin {}, skipped", file.path.display());
            return false;
        }
        self.files.push(file);
        self.expected += 1;
        true
    }

    /// Attach a set-level plugin, deduplicated by id.
    pub fn use_plugin(&mut self, plugin: Arc<dyn SetPlugin>) {
        if self.plugin_ids.insert(plugin.id().to_string()) {
            self.plugins.push(plugin);
        }
    }

    /// Record that a file reached the queue stage.
    pub fn mark_queued(&mut self, origin: PathBuf) {
        self.queued.insert(origin);
    }

    /// Whether a file's origin has reached the queue stage.
    pub fn is_queued(&self, origin: &Path) -> bool {
        self.queued.contains(origin)
    }

    /// True when every currently-known file has reached the barrier.
    pub fn barrier_ready(&self) -> bool {
        !self.files.is_empty()
            && self
                .files
                .iter()
                .all(|file| self.queued.contains(file.origin()))
    }

    /// True when the barrier is ready and the set plugins have not run yet.
    pub fn should_fire(&self) -> bool {
        self.barrier_ready() && !self.fired
    }

    /// Run every attached set-level plugin once.
    ///
    /// Plugins may add files to the set while running; those files still get
    /// the full per-file pipeline afterwards, but the barrier never fires a
    /// second time. Set-level plugins attached during the flush are dropped
    /// from execution for the same reason.
    pub fn fire(&mut self) -> Result<()> {
        debug_assert!(!self.fired);
        self.fired = true;
        let plugins = std::mem::take(&mut self.plugins);
        let mut outcome = Ok(());
        for plugin in &plugins {
            debug!("running file-set plugin `{}`", plugin.id());
            if let Err(error) = plugin.run(self) {
                outcome = Err(error);
                break;
            }
        }
        // Anything attached mid-flush lands after the originals.
        let added = std::mem::replace(&mut self.plugins, plugins);
        self.plugins.extend(added);
        outcome
    }

    /// Record that a file finished the entire per-file pipeline.
    pub fn complete_one(&mut self) {
        self.actual += 1;
    }

    /// True once every expected file has finished.
    pub fn is_done(&self) -> bool {
        self.actual >= self.expected
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[VirtualFile] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut [VirtualFile] {
        &mut self.files
    }

    /// Consume the set, yielding the files for reporting.
    pub fn into_files(self) -> Vec<VirtualFile> {
        self.files
    }

    /// Temporarily take a file out of the set so it can be mutated alongside
    /// the set itself. Must be paired with [`FileSet::put_file`].
    pub(crate) fn take_file(&mut self, index: usize) -> VirtualFile {
        std::mem::take(&mut self.files[index])
    }

    pub(crate) fn put_file(&mut self, index: usize, file: VirtualFile) {
        self.files[index] = file;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        id: String,
        runs: Arc<AtomicUsize>,
    }

    impl SetPlugin for Counting {
        fn id(&self) -> &str {
            &self.id
        }

        fn run(&self, _set: &mut FileSet) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn file(name: &str) -> VirtualFile {
        VirtualFile::new(name, "/work")
    }

    #[test]
    fn test_add_deduplicates_by_origin() {
        let mut set = FileSet::new();
        assert!(set.add(file("a.md")));
        assert!(!set.add(file("a.md")));
        assert_eq!(set.len(), 1);

        // A renamed file keeps its origin identity.
        let mut renamed = file("a.md");
        renamed.rename("b.md");
        assert!(!set.add(renamed));
    }

    #[test]
    fn test_barrier_requires_all_files_queued() {
        let mut set = FileSet::new();
        set.add(file("a.md"));
        set.add(file("b.md"));
        assert!(!set.barrier_ready());

        set.mark_queued(PathBuf::from("a.md"));
        assert!(!set.barrier_ready());

        set.mark_queued(PathBuf::from("b.md"));
        assert!(set.barrier_ready());
    }

    #[test]
    fn test_empty_set_is_not_ready() {
        let set = FileSet::new();
        assert!(!set.barrier_ready());
    }

    #[test]
    fn test_plugins_run_exactly_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut set = FileSet::new();
        set.add(file("a.md"));
        set.use_plugin(Arc::new(Counting {
            id: "counting".to_string(),
            runs: runs.clone(),
        }));
        set.mark_queued(PathBuf::from("a.md"));

        assert!(set.should_fire());
        set.fire().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!set.should_fire());
    }

    #[test]
    fn test_plugin_dedup_by_id() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut set = FileSet::new();
        set.add(file("a.md"));
        for _ in 0..2 {
            set.use_plugin(Arc::new(Counting {
                id: "same".to_string(),
                runs: runs.clone(),
            }));
        }
        set.mark_queued(PathBuf::from("a.md"));
        set.fire().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_files_added_mid_fire_do_not_refire() {
        struct Adding;
        impl SetPlugin for Adding {
            fn id(&self) -> &str {
                "adding"
            }
            fn run(&self, set: &mut FileSet) -> Result<()> {
                set.add(VirtualFile::new("late.md", "/work"));
                Ok(())
            }
        }

        let mut set = FileSet::new();
        set.add(file("a.md"));
        set.use_plugin(Arc::new(Adding));
        set.mark_queued(PathBuf::from("a.md"));
        set.fire().unwrap();

        assert_eq!(set.len(), 2);
        // The late file has not queued, but the barrier must not fire again.
        assert!(!set.should_fire());
    }

    #[test]
    fn test_done_tracking() {
        let mut set = FileSet::new();
        set.add(file("a.md"));
        set.add(file("b.md"));
        assert!(!set.is_done());
        set.complete_one();
        assert!(!set.is_done());
        set.complete_one();
        assert!(set.is_done());
    }
}
