//! Plugin capability interfaces and the registry loader
//!
//! Dynamic plugin loading is modeled as an explicit seam: names are turned
//! into [`PluginId`]s by a [`PluginLoader`], and ids are turned into plugin
//! instances by the same loader, so the loading mechanism is swappable and
//! testable. The default [`Registry`] keeps a programmatic name-to-plugin
//! map with an optional prefix applied during resolution, which also makes
//! two spellings of the same plugin (`trim` vs `textmill-trim`) collapse to
//! one configured entry.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::fileset::FileSet;
use crate::processor::Tree;
use crate::vfile::VirtualFile;

/// Resolved plugin identity. Configuration entries are keyed by this, not by
/// the raw name, so differently spelled references merge.
pub type PluginId = String;

/// A per-file plugin.
pub trait Plugin: Send + Sync {
    /// Attach-time hook, called once per file during the `configure` stage.
    ///
    /// The file set is passed so a plugin can register file-set-level
    /// behavior via [`FileSet::use_plugin`].
    fn configure(&self, _options: &Value, _set: &mut FileSet) -> Result<()> {
        Ok(())
    }

    /// Transform the file's syntax tree.
    fn transform(&self, tree: &mut Tree, file: &mut VirtualFile, options: &Value) -> Result<()>;
}

/// A file-set-level plugin, run exactly once after every file has reached
/// the queue barrier. Deduplicated by [`SetPlugin::id`].
pub trait SetPlugin: Send + Sync {
    fn id(&self) -> &str;

    fn run(&self, set: &mut FileSet) -> Result<()>;
}

/// Turns plugin names into ids and ids into instances.
pub trait PluginLoader: Send + Sync {
    /// Resolve a raw name to a stable id. `base` is the directory the name
    /// was configured in, for loaders that resolve relative to it.
    fn resolve(&self, name: &str, base: &Path) -> Result<PluginId>;

    /// Load a previously resolved id.
    fn load(&self, id: &PluginId) -> Result<Arc<dyn Plugin>>;
}

/// The default loader: an in-process registry of named plugins.
#[derive(Default)]
pub struct Registry {
    prefix: Option<String>,
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prefix tried during resolution (`{prefix}-{name}`).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Register a plugin under its canonical name.
    pub fn register(&mut self, name: impl Into<String>, plugin: Arc<dyn Plugin>) {
        self.plugins.insert(name.into(), plugin);
    }
}

impl PluginLoader for Registry {
    fn resolve(&self, name: &str, _base: &Path) -> Result<PluginId> {
        if let Some(prefix) = &self.prefix {
            let prefixed = format!("{}-{}", prefix, name);
            if self.plugins.contains_key(&prefixed) {
                return Ok(prefixed);
            }
        }
        if self.plugins.contains_key(name) {
            return Ok(name.to_string());
        }
        Err(Error::PluginResolve {
            name: name.to_string(),
        })
    }

    fn load(&self, id: &PluginId) -> Result<Arc<dyn Plugin>> {
        self.plugins
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PluginLoad {
                id: id.clone(),
                message: "not registered".to_string(),
            })
    }
}

/// Built-in plugins shipped with the CLI; they operate on the text
/// processor's tree shape (`{"type": "text", "value": ...}`).
pub mod builtin {
    use super::*;
    use crate::processor::{text_value, text_value_mut};

    /// Strips trailing whitespace from every line.
    pub struct TrimTrailingWhitespace;

    impl Plugin for TrimTrailingWhitespace {
        fn transform(
            &self,
            tree: &mut Tree,
            _file: &mut VirtualFile,
            _options: &Value,
        ) -> Result<()> {
            let text = text_value(tree)?;
            let mut trimmed = text
                .lines()
                .map(|line| line.trim_end())
                .collect::<Vec<_>>()
                .join("\n");
            if text.ends_with('\n') {
                trimmed.push('\n');
            }
            *text_value_mut(tree)? = Value::String(trimmed);
            Ok(())
        }
    }

    /// Ensures the text ends with exactly one trailing newline.
    pub struct FinalNewline;

    impl Plugin for FinalNewline {
        fn transform(
            &self,
            tree: &mut Tree,
            _file: &mut VirtualFile,
            _options: &Value,
        ) -> Result<()> {
            let text = text_value(tree)?;
            let fixed = format!("{}\n", text.trim_end_matches('\n'));
            *text_value_mut(tree)? = Value::String(fixed);
            Ok(())
        }
    }

    /// Register the built-ins into a registry under the given prefix.
    pub fn register_all(registry: &mut Registry, prefix: &str) {
        registry.register(
            format!("{}-trim-trailing-whitespace", prefix),
            Arc::new(TrimTrailingWhitespace),
        );
        registry.register(format!("{}-final-newline", prefix), Arc::new(FinalNewline));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{Processor, TextProcessor};
    use serde_json::Map;

    struct Noop;
    impl Plugin for Noop {
        fn transform(&self, _: &mut Tree, _: &mut VirtualFile, _: &Value) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_resolves_prefixed_spelling_first() {
        let mut registry = Registry::new().with_prefix("textmill");
        registry.register("textmill-trim", Arc::new(Noop));

        let base = Path::new("/work");
        assert_eq!(registry.resolve("trim", base).unwrap(), "textmill-trim");
        assert_eq!(
            registry.resolve("textmill-trim", base).unwrap(),
            "textmill-trim"
        );
    }

    #[test]
    fn test_registry_unknown_name_errors() {
        let registry = Registry::new();
        let result = registry.resolve("nope", Path::new("/work"));
        assert!(matches!(result, Err(Error::PluginResolve { .. })));
    }

    #[test]
    fn test_registry_load_unknown_id_errors() {
        let registry = Registry::new();
        let result = registry.load(&"nope".to_string());
        assert!(matches!(result, Err(Error::PluginLoad { .. })));
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        let processor = TextProcessor;
        let settings = Map::new();
        let mut tree = processor.parse("a  \nb\t\nc\n", &settings).unwrap();
        let mut file = VirtualFile::new("a.txt", "/work");

        builtin::TrimTrailingWhitespace
            .transform(&mut tree, &mut file, &Value::Null)
            .unwrap();

        let out = processor.stringify(&tree, &settings).unwrap();
        assert_eq!(out, "a\nb\nc\n");
    }

    #[test]
    fn test_final_newline() {
        let processor = TextProcessor;
        let settings = Map::new();
        let mut tree = processor.parse("a\nb", &settings).unwrap();
        let mut file = VirtualFile::new("a.txt", "/work");

        builtin::FinalNewline
            .transform(&mut tree, &mut file, &Value::Null)
            .unwrap();

        let out = processor.stringify(&tree, &settings).unwrap();
        assert_eq!(out, "a\nb\n");
    }
}
