//! Layered configuration resolution
//!
//! Configuration for a file is assembled by walking the directory tree
//! upward from the file, merging every rc fragment found on the way
//! (root-most first, so nearer configuration overrides farther), then
//! applying the explicit rc file and finally the invocation-level settings,
//! plugins, presets, and output target. Results are cached per directory;
//! failures are sticky so a broken rc file is reported once per directory
//! instead of re-parsed for every sibling.
//!
//! ## Merge semantics
//!
//! Plain objects deep-merge; scalars and arrays are replaced by the more
//! specific source. Two keys get special treatment:
//!
//! - `presets` are expanded in place: the named fragment is loaded and
//!   merged as if its contents were written inline, with plugin resolution
//!   rooted at the preset's directory.
//! - `plugins` are keyed by *resolved* plugin id, so the same plugin
//!   configured under two spellings collapses into one entry. `false`
//!   disables a plugin without removing its slot; an options table
//!   re-merges over any earlier options.
//!
//! ## On-disk formats
//!
//! Per directory the first match of `{rc}`, `{rc}.yaml`, `{rc}.toml`, and
//! `package.json` (when a package field is configured) is used. The bare rc
//! file and `package.json` are JSON; the others are what their extension
//! says. All parse into the same fragment shape.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::plugin::{PluginId, PluginLoader};
use crate::processor::Settings;

/// Where processed output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write each file back to its own path
    WriteBack,
    /// Write to a directory or, in one-file mode, a single file
    Path(PathBuf),
}

/// Options for one configured plugin.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginOptions {
    /// Explicitly disabled; keeps its slot so later layers can re-enable it
    Off,
    /// Enabled, with an options value (`Null` when none were given)
    On(Value),
}

/// One configured plugin, keyed by resolved id.
#[derive(Debug, Clone)]
pub struct PluginEntry {
    pub id: PluginId,
    pub options: PluginOptions,
}

/// A fully merged configuration for one directory.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Ordered plugin entries, keyed by resolved id
    pub plugins: Vec<PluginEntry>,
    /// Processor settings
    pub settings: Settings,
    /// Output routing, if any layer requested it
    pub output: Option<OutputTarget>,
}

impl Config {
    /// Upsert a plugin entry by id, applying the layered-merge rules.
    fn configure_plugin(&mut self, id: PluginId, incoming: PluginOptions) {
        let Some(entry) = self.plugins.iter_mut().find(|entry| entry.id == id) else {
            self.plugins.push(PluginEntry {
                id,
                options: incoming,
            });
            return;
        };
        match incoming {
            PluginOptions::Off => entry.options = PluginOptions::Off,
            // Re-configuring with no options keeps what is there.
            PluginOptions::On(Value::Null) => {}
            PluginOptions::On(next) => match &mut entry.options {
                PluginOptions::On(previous) => deep_merge(previous, &next),
                PluginOptions::Off => entry.options = PluginOptions::On(next),
            },
        }
    }
}

/// Hook applied to every raw fragment before it is interpreted.
pub type ConfigTransform = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// How the resolver locates and layers configuration.
#[derive(Default)]
pub struct ResolverOptions {
    /// Whether to walk the directory tree for rc files at all
    pub detect_config: bool,
    /// Base name of rc files (e.g. `.textmillrc`)
    pub rc_name: Option<String>,
    /// Explicit configuration file, merged after the detected layers
    pub rc_path: Option<PathBuf>,
    /// `package.json` member to read configuration from
    pub package_field: Option<String>,
    /// Invocation-level settings (highest precedence)
    pub settings: Settings,
    /// Invocation-level plugins by raw name, with optional options
    pub plugins: Vec<(String, Option<Value>)>,
    /// Invocation-level presets by name
    pub presets: Vec<String>,
    /// Invocation-level output target
    pub output: Option<OutputTarget>,
    /// Prefix tried when resolving preset names (`{prefix}-{name}`)
    pub preset_prefix: Option<String>,
    /// Fragment rewrite hook
    pub config_transform: Option<ConfigTransform>,
}

enum CacheEntry {
    Resolved(Arc<Config>),
    /// Sticky failure: re-lookups re-report without re-resolving
    Failed(String),
}

/// Resolves and caches per-directory configuration.
pub struct ConfigResolver {
    cwd: PathBuf,
    options: ResolverOptions,
    loader: Arc<dyn PluginLoader>,
    cache: HashMap<PathBuf, CacheEntry>,
}

impl ConfigResolver {
    pub fn new(cwd: &Path, options: ResolverOptions, loader: Arc<dyn PluginLoader>) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            options,
            loader,
            cache: HashMap::new(),
        }
    }

    /// Resolve the configuration that applies to `file_path`.
    ///
    /// The file's directory is the cache key; repeated lookups for files in
    /// one directory share a single resolution, and a failed resolution
    /// stays failed.
    pub fn load(&mut self, file_path: &Path) -> Result<Arc<Config>> {
        let absolute = self.cwd.join(file_path);
        let directory = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cwd.clone());

        if let Some(entry) = self.cache.get(&directory) {
            return match entry {
                CacheEntry::Resolved(config) => Ok(config.clone()),
                CacheEntry::Failed(message) => Err(Error::Configuration {
                    message: message.clone(),
                    source_path: None,
                }),
            };
        }

        match self.resolve(&directory) {
            Ok(config) => {
                let config = Arc::new(config);
                self.cache
                    .insert(directory, CacheEntry::Resolved(config.clone()));
                Ok(config)
            }
            Err(error) => {
                self.cache
                    .insert(directory, CacheEntry::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Number of materialized cache entries (including sticky failures).
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn resolve(&self, directory: &Path) -> Result<Config> {
        let mut config = Config::default();

        if self.options.detect_config {
            let fragments = self.find_fragments(directory)?;
            if fragments.is_empty() {
                // Personal fallback when nothing project-level exists.
                if let Some(home) = dirs::home_dir() {
                    if let Some(path) = self.fragment_in(&home)? {
                        debug!("using personal configuration at {}", path.display());
                        self.merge_file(&mut config, &path)?;
                    }
                }
            } else {
                // Root-most first so nearer configuration overrides farther.
                for path in fragments.iter().rev() {
                    self.merge_file(&mut config, path)?;
                }
            }
        }

        if let Some(rc_path) = &self.options.rc_path {
            let path = self.cwd.join(rc_path);
            if !path.is_file() {
                return Err(Error::Configuration {
                    message: "explicit configuration file not found".to_string(),
                    source_path: Some(path),
                });
            }
            self.merge_file(&mut config, &path)?;
        }

        // Invocation-level layers, highest precedence.
        for name in &self.options.presets {
            self.expand_preset(&mut config, name, &self.cwd)?;
        }
        for (name, options) in &self.options.plugins {
            let id = self.loader.resolve(name, &self.cwd)?;
            let incoming = match options {
                None => PluginOptions::On(Value::Null),
                Some(value) => PluginOptions::On(value.clone()),
            };
            config.configure_plugin(id, incoming);
        }
        if !self.options.settings.is_empty() {
            merge_settings(&mut config.settings, &self.options.settings);
        }
        if let Some(output) = &self.options.output {
            config.output = Some(output.clone());
        }

        Ok(config)
    }

    /// Candidate fragment files from `directory` up to the root, nearest
    /// first. At most one file per directory.
    fn find_fragments(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let mut fragments = Vec::new();
        let mut current = Some(directory);
        while let Some(dir) = current {
            if let Some(path) = self.fragment_in(dir)? {
                fragments.push(path);
            }
            current = dir.parent();
        }
        Ok(fragments)
    }

    /// First matching rc candidate inside one directory.
    ///
    /// A `package.json` that fails to parse is an error, not a skip: the
    /// fragment it may hold cannot be ruled out.
    fn fragment_in(&self, directory: &Path) -> Result<Option<PathBuf>> {
        if let Some(rc_name) = &self.options.rc_name {
            for candidate in [
                rc_name.clone(),
                format!("{}.yaml", rc_name),
                format!("{}.toml", rc_name),
            ] {
                let path = directory.join(candidate);
                if path.is_file() {
                    return Ok(Some(path));
                }
            }
        }
        if self.options.package_field.is_some() {
            let path = directory.join("package.json");
            if path.is_file() && self.package_fragment(&path)?.is_some() {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// Load one fragment file and merge it into the running configuration.
    fn merge_file(&self, config: &mut Config, path: &Path) -> Result<()> {
        let Some(raw) = self.load_fragment(path)? else {
            return Ok(());
        };
        let raw = match &self.options.config_transform {
            Some(transform) => transform(raw),
            None => raw,
        };
        let base = path.parent().unwrap_or(&self.cwd).to_path_buf();
        self.merge_fragment(config, raw, &base)
            .map_err(|error| match error {
                Error::Configuration {
                    message,
                    source_path: None,
                } => Error::Configuration {
                    message,
                    source_path: Some(path.to_path_buf()),
                },
                other => other,
            })
    }

    /// Parse a fragment file by its extension.
    fn load_fragment(&self, path: &Path) -> Result<Option<Value>> {
        if path.file_name().and_then(|n| n.to_str()) == Some("package.json") {
            return self.package_fragment(path);
        }
        let text = fs::read_to_string(path)?;
        let value = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str::<Value>(&text).map_err(|e| Error::Configuration {
                    message: e.to_string(),
                    source_path: Some(path.to_path_buf()),
                })?
            }
            Some("toml") => {
                toml::from_str::<Value>(&text).map_err(|e| Error::Configuration {
                    message: e.to_string(),
                    source_path: Some(path.to_path_buf()),
                })?
            }
            // The bare rc file and `.json` are both JSON.
            _ => serde_json::from_str::<Value>(&text).map_err(|e| Error::Configuration {
                message: e.to_string(),
                source_path: Some(path.to_path_buf()),
            })?,
        };
        Ok(Some(value))
    }

    /// Extract the configured member of a `package.json`.
    fn package_fragment(&self, path: &Path) -> Result<Option<Value>> {
        let Some(field) = &self.options.package_field else {
            return Ok(None);
        };
        let text = fs::read_to_string(path)?;
        let package: Value =
            serde_json::from_str(&text).map_err(|e| Error::Configuration {
                message: e.to_string(),
                source_path: Some(path.to_path_buf()),
            })?;
        Ok(package.get(field).cloned())
    }

    /// Interpret one raw fragment. `base` roots preset and plugin
    /// resolution for names configured in this fragment.
    fn merge_fragment(&self, config: &mut Config, raw: Value, base: &Path) -> Result<()> {
        let Value::Object(map) = raw else {
            return Err(Error::Configuration {
                message: "configuration fragment must be a mapping".to_string(),
                source_path: None,
            });
        };

        // Presets first, so sibling keys in this fragment override them.
        if let Some(presets) = map.get("presets") {
            self.merge_presets(config, presets, base)?;
        }
        if let Some(plugins) = map.get("plugins") {
            self.merge_plugins(config, plugins, base)?;
        }
        if let Some(settings) = map.get("settings") {
            let Value::Object(settings) = settings else {
                return Err(Error::Configuration {
                    message: "`settings` must be a mapping".to_string(),
                    source_path: None,
                });
            };
            merge_settings(&mut config.settings, settings);
        }
        if let Some(output) = map.get("output") {
            config.output = match output {
                Value::Bool(true) => Some(OutputTarget::WriteBack),
                Value::Bool(false) => None,
                Value::String(path) => Some(OutputTarget::Path(PathBuf::from(path))),
                other => {
                    return Err(Error::Configuration {
                        message: format!("`output` must be a boolean or a path, got {}", other),
                        source_path: None,
                    })
                }
            };
        }

        Ok(())
    }

    fn merge_presets(&self, config: &mut Config, presets: &Value, base: &Path) -> Result<()> {
        match presets {
            Value::Array(names) => {
                for name in names {
                    let Value::String(name) = name else {
                        return Err(Error::Configuration {
                            message: "preset entries must be names".to_string(),
                            source_path: None,
                        });
                    };
                    self.expand_preset(config, name, base)?;
                }
            }
            Value::Object(map) => {
                for (name, overrides) in map {
                    self.expand_preset(config, name, base)?;
                    // The mapping form layers its value over the expansion.
                    if let Value::Object(_) = overrides {
                        self.merge_fragment(config, overrides.clone(), base)?;
                    }
                }
            }
            other => {
                return Err(Error::Configuration {
                    message: format!("`presets` must be a list or mapping, got {}", other),
                    source_path: None,
                })
            }
        }
        Ok(())
    }

    /// Load a preset by name and merge it as if written inline.
    fn expand_preset(&self, config: &mut Config, name: &str, base: &Path) -> Result<()> {
        let path = self.resolve_preset(name, base).ok_or_else(|| {
            Error::Configuration {
                message: format!("cannot resolve preset `{}`", name),
                source_path: None,
            }
        })?;
        debug!("expanding preset `{}` from {}", name, path.display());
        let Some(raw) = self.load_fragment(&path)? else {
            return Ok(());
        };
        let raw = match &self.options.config_transform {
            Some(transform) => transform(raw),
            None => raw,
        };
        // Plugin resolution moves to the preset's own directory.
        let preset_base = path.parent().unwrap_or(base).to_path_buf();
        self.merge_fragment(config, raw, &preset_base)
    }

    fn resolve_preset(&self, name: &str, base: &Path) -> Option<PathBuf> {
        let mut stems = Vec::new();
        if let Some(prefix) = &self.options.preset_prefix {
            if !name.starts_with(prefix) {
                stems.push(format!("{}-{}", prefix, name));
            }
        }
        stems.push(name.to_string());

        for stem in stems {
            for candidate in [
                stem.clone(),
                format!("{}.yaml", stem),
                format!("{}.toml", stem),
                format!("{}.json", stem),
            ] {
                let path = base.join(candidate);
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }

    fn merge_plugins(&self, config: &mut Config, plugins: &Value, base: &Path) -> Result<()> {
        match plugins {
            Value::Array(names) => {
                for name in names {
                    let Value::String(name) = name else {
                        return Err(Error::Configuration {
                            message: "plugin list entries must be names".to_string(),
                            source_path: None,
                        });
                    };
                    let id = self.loader.resolve(name, base)?;
                    config.configure_plugin(id, PluginOptions::On(Value::Null));
                }
            }
            Value::Object(map) => {
                for (name, options) in map {
                    let id = self.loader.resolve(name, base)?;
                    let incoming = match options {
                        Value::Bool(false) => PluginOptions::Off,
                        Value::Null => PluginOptions::On(Value::Null),
                        other => PluginOptions::On(other.clone()),
                    };
                    config.configure_plugin(id, incoming);
                }
            }
            other => {
                return Err(Error::Configuration {
                    message: format!("`plugins` must be a list or mapping, got {}", other),
                    source_path: None,
                })
            }
        }
        Ok(())
    }
}

/// Deep-merge `source` over `target`: objects merge recursively, everything
/// else is replaced.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

fn merge_settings(target: &mut Settings, source: &Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{Plugin, Registry};
    use crate::processor::Tree;
    use crate::vfile::VirtualFile;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    struct Noop;
    impl Plugin for Noop {
        fn transform(
            &self,
            _: &mut Tree,
            _: &mut VirtualFile,
            _: &Value,
        ) -> crate::error::Result<()> {
            Ok(())
        }
    }

    fn loader(names: &[&str]) -> Arc<dyn PluginLoader> {
        let mut registry = Registry::new().with_prefix("textmill");
        for name in names {
            registry.register(*name, Arc::new(Noop));
        }
        Arc::new(registry)
    }

    fn write(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn detect_options() -> ResolverOptions {
        ResolverOptions {
            detect_config: true,
            rc_name: Some(".millrc".to_string()),
            ..ResolverOptions::default()
        }
    }

    #[test]
    fn test_nearest_rc_wins_with_deep_merge() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            ".millrc",
            r#"{"settings": {"wrap": {"width": 80, "mode": "hard"}}}"#,
        );
        write(
            temp.path(),
            "sub/.millrc",
            r#"{"settings": {"wrap": {"width": 100}}}"#,
        );

        let mut resolver = ConfigResolver::new(temp.path(), detect_options(), loader(&[]));
        let config = resolver.load(Path::new("sub/doc.txt")).unwrap();

        // Child overrides width, parent's mode survives the deep merge.
        assert_eq!(config.settings["wrap"]["width"], json!(100));
        assert_eq!(config.settings["wrap"]["mode"], json!("hard"));
    }

    #[test]
    fn test_yaml_and_toml_fragments() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".millrc.yaml", "settings:\n  wrap: true\n");
        let mut resolver = ConfigResolver::new(temp.path(), detect_options(), loader(&[]));
        let config = resolver.load(Path::new("doc.txt")).unwrap();
        assert_eq!(config.settings["wrap"], json!(true));

        let temp = TempDir::new().unwrap();
        write(temp.path(), ".millrc.toml", "[settings]\nwidth = 72\n");
        let mut resolver = ConfigResolver::new(temp.path(), detect_options(), loader(&[]));
        let config = resolver.load(Path::new("doc.txt")).unwrap();
        assert_eq!(config.settings["width"], json!(72));
    }

    #[test]
    fn test_package_json_field() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "package.json",
            r#"{"name": "x", "millConfig": {"settings": {"quiet": true}}}"#,
        );
        let options = ResolverOptions {
            detect_config: true,
            package_field: Some("millConfig".to_string()),
            ..ResolverOptions::default()
        };
        let mut resolver = ConfigResolver::new(temp.path(), options, loader(&[]));
        let config = resolver.load(Path::new("doc.txt")).unwrap();
        assert_eq!(config.settings["quiet"], json!(true));
    }

    #[test]
    fn test_plugin_spellings_collapse_and_options_merge() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            ".millrc",
            r#"{"plugins": {"trim": {"level": 1, "keep": true}}}"#,
        );
        write(
            temp.path(),
            "sub/.millrc",
            r#"{"plugins": {"textmill-trim": {"level": 2}}}"#,
        );

        let mut resolver =
            ConfigResolver::new(temp.path(), detect_options(), loader(&["textmill-trim"]));
        let config = resolver.load(Path::new("sub/doc.txt")).unwrap();

        assert_eq!(config.plugins.len(), 1);
        assert_eq!(config.plugins[0].id, "textmill-trim");
        match &config.plugins[0].options {
            PluginOptions::On(value) => {
                assert_eq!(value["level"], json!(2));
                assert_eq!(value["keep"], json!(true));
            }
            other => panic!("unexpected options: {:?}", other),
        }
    }

    #[test]
    fn test_false_disables_without_removing() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".millrc", r#"{"plugins": {"trim": {"a": 1}}}"#);
        write(temp.path(), "sub/.millrc", r#"{"plugins": {"trim": false}}"#);

        let mut resolver =
            ConfigResolver::new(temp.path(), detect_options(), loader(&["textmill-trim"]));
        let config = resolver.load(Path::new("sub/doc.txt")).unwrap();

        assert_eq!(config.plugins.len(), 1);
        assert_eq!(config.plugins[0].options, PluginOptions::Off);
    }

    #[test]
    fn test_preset_expansion() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "textmill-base.json",
            r#"{"plugins": {"trim": null}, "settings": {"width": 72}}"#,
        );
        write(
            temp.path(),
            ".millrc",
            r#"{"presets": ["base"], "settings": {"width": 100}}"#,
        );

        let mut options = detect_options();
        options.preset_prefix = Some("textmill".to_string());
        let mut resolver =
            ConfigResolver::new(temp.path(), options, loader(&["textmill-trim"]));
        let config = resolver.load(Path::new("doc.txt")).unwrap();

        assert_eq!(config.plugins.len(), 1);
        // Sibling settings in the rc override the expanded preset.
        assert_eq!(config.settings["width"], json!(100));
    }

    #[test]
    fn test_invocation_layers_have_highest_precedence() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".millrc", r#"{"settings": {"width": 72}, "output": true}"#);

        let mut options = detect_options();
        options
            .settings
            .insert("width".to_string(), json!(120));
        options.output = Some(OutputTarget::Path(PathBuf::from("out")));
        let mut resolver = ConfigResolver::new(temp.path(), options, loader(&[]));
        let config = resolver.load(Path::new("doc.txt")).unwrap();

        assert_eq!(config.settings["width"], json!(120));
        assert_eq!(config.output, Some(OutputTarget::Path(PathBuf::from("out"))));
    }

    #[test]
    fn test_cache_shared_per_directory() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".millrc", r#"{"settings": {"a": 1}}"#);

        let mut resolver = ConfigResolver::new(temp.path(), detect_options(), loader(&[]));
        let first = resolver.load(Path::new("a.txt")).unwrap();
        let second = resolver.load(Path::new("b.txt")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn test_failed_resolution_is_sticky() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".millrc", "{not json");

        let mut resolver = ConfigResolver::new(temp.path(), detect_options(), loader(&[]));
        assert!(resolver.load(Path::new("a.txt")).is_err());
        assert_eq!(resolver.cached(), 1);
        // Second lookup reports without re-resolving.
        assert!(resolver.load(Path::new("b.txt")).is_err());
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn test_malformed_package_json_is_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", "{not valid json");

        let options = ResolverOptions {
            detect_config: true,
            package_field: Some("millConfig".to_string()),
            ..ResolverOptions::default()
        };
        let mut resolver = ConfigResolver::new(temp.path(), options, loader(&[]));
        let result = resolver.load(Path::new("doc.txt"));
        assert!(matches!(result, Err(Error::Configuration { .. })));
        // Failure is sticky like any other broken fragment.
        assert!(resolver.load(Path::new("other.txt")).is_err());
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn test_missing_rc_path_is_error() {
        let temp = TempDir::new().unwrap();
        let options = ResolverOptions {
            rc_path: Some(PathBuf::from("nope.json")),
            ..ResolverOptions::default()
        };
        let mut resolver = ConfigResolver::new(temp.path(), options, loader(&[]));
        assert!(resolver.load(Path::new("a.txt")).is_err());
    }

    #[test]
    fn test_unresolvable_plugin_is_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".millrc", r#"{"plugins": {"ghost": null}}"#);
        let mut resolver = ConfigResolver::new(temp.path(), detect_options(), loader(&[]));
        assert!(resolver.load(Path::new("a.txt")).is_err());
    }

    #[test]
    fn test_output_false_clears() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".millrc", r#"{"output": "dist"}"#);
        write(temp.path(), "sub/.millrc", r#"{"output": false}"#);

        let mut resolver = ConfigResolver::new(temp.path(), detect_options(), loader(&[]));
        let config = resolver.load(Path::new("sub/doc.txt")).unwrap();
        assert_eq!(config.output, None);
    }

    #[test]
    fn test_config_transform_rewrites_fragments() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".millrc", r#"{"prefs": {"width": 90}}"#);

        let mut options = detect_options();
        options.config_transform = Some(Box::new(|raw| {
            // Project uses a legacy `prefs` key; lift it into `settings`.
            json!({ "settings": raw.get("prefs").cloned().unwrap_or(Value::Null) })
        }));
        let mut resolver = ConfigResolver::new(temp.path(), options, loader(&[]));
        let config = resolver.load(Path::new("doc.txt")).unwrap();
        assert_eq!(config.settings["width"], json!(90));
    }

    #[test]
    fn test_deep_merge_replaces_arrays() {
        let mut target = json!({"list": [1, 2], "keep": true});
        deep_merge(&mut target, &json!({"list": [3]}));
        assert_eq!(target, json!({"list": [3], "keep": true}));
    }
}
