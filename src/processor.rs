//! The parser/stringifier seam
//!
//! A [`Processor`] turns source text into a [`Tree`] and back. The tree is a
//! plain `serde_json::Value`, which keeps the tree-in/tree-out modes (where
//! the pipeline's input or output is a serialized syntax tree) a direct
//! serialization of the working representation.

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// Syntax tree shared between the processor and plugins.
pub type Tree = Value;

/// Processor settings, merged from configuration layers.
pub type Settings = Map<String, Value>;

/// A parser/stringifier pair.
pub trait Processor: Send + Sync {
    /// Parse source text into a tree.
    fn parse(&self, text: &str, settings: &Settings) -> Result<Tree>;

    /// Serialize a tree back to source text.
    fn stringify(&self, tree: &Tree, settings: &Settings) -> Result<String>;

    /// Canonical file extension for this processor's output.
    fn extension(&self) -> &str;
}

/// The default processor for the CLI: a passthrough over plain text.
///
/// The tree shape is `{"type": "text", "value": <contents>}`.
pub struct TextProcessor;

impl Processor for TextProcessor {
    fn parse(&self, text: &str, _settings: &Settings) -> Result<Tree> {
        Ok(json!({ "type": "text", "value": text }))
    }

    fn stringify(&self, tree: &Tree, _settings: &Settings) -> Result<String> {
        Ok(text_value(tree)?.to_string())
    }

    fn extension(&self) -> &str {
        "txt"
    }
}

/// Borrow the `value` string of a text tree.
pub fn text_value(tree: &Tree) -> Result<&str> {
    tree.get("value")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Processor {
            message: "expected a text tree with a string `value`".to_string(),
        })
}

/// Borrow the `value` slot of a text tree mutably.
pub fn text_value_mut(tree: &mut Tree) -> Result<&mut Value> {
    tree.get_mut("value").ok_or_else(|| Error::Processor {
        message: "expected a text tree with a `value` member".to_string(),
    })
}
