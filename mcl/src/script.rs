//! Script definition tree.
//!
//! Scripts are read from the `scripts` object of the merged configuration and
//! converted once into a [`ScriptNode`] tree. A node is either a branch that
//! needs one more argument to pick a child, or a leaf holding command templates.

use serde_json::Value;
use std::collections::BTreeMap;

/// Top-level script collection, keyed by script name.
pub type ScriptMap = BTreeMap<String, ScriptNode>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptNode {
    /// Dispatch node; keys are kept sorted for listings and error messages.
    Branch(BTreeMap<String, ScriptNode>),
    /// Ordered command templates.
    Steps(Vec<String>),
    /// Payload that is neither a string, an array of strings nor an object.
    /// Holds the JSON type name for diagnostics.
    Invalid(&'static str),
}

impl ScriptNode {
    /// Build a node from its JSON definition.
    ///
    /// An empty object becomes a leaf with zero steps. Arrays containing
    /// anything other than strings are kept as [`ScriptNode::Invalid`] so a
    /// single bad entry does not prevent the rest of the config from loading.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(step) => Self::Steps(vec![step.clone()]),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map_or(Self::Invalid("array with non-string steps"), Self::Steps),
            Value::Object(map) if map.is_empty() => Self::Steps(Vec::new()),
            Value::Object(map) => Self::Branch(
                map.iter()
                    .map(|(key, child)| (key.clone(), Self::from_value(child)))
                    .collect(),
            ),
            Value::Null => Self::Invalid("null"),
            Value::Bool(_) => Self::Invalid("boolean"),
            Value::Number(_) => Self::Invalid("number"),
        }
    }
}

/// Convert a JSON `scripts` object into a script collection.
#[must_use]
pub fn scripts_from_object(object: &serde_json::Map<String, Value>) -> ScriptMap {
    object
        .iter()
        .map(|(name, value)| (name.clone(), ScriptNode::from_value(value)))
        .collect()
}

/// Dotted representation of a script path, e.g. `example.date.utc`.
#[must_use]
pub fn format_path(script_name: &str, fragments: &[String]) -> String {
    if fragments.is_empty() {
        script_name.to_string()
    } else {
        format!("{script_name}.{}", fragments.join("."))
    }
}

/// Dotted paths of every runnable script, sorted.
///
/// Empty branches count as runnable (they resolve to zero steps). Invalid
/// nodes are skipped; resolving them reports the problem instead.
#[must_use]
pub fn list_paths(scripts: &ScriptMap) -> Vec<String> {
    fn walk(prefix: &mut Vec<String>, node: &ScriptNode, paths: &mut Vec<String>) {
        match node {
            ScriptNode::Branch(children) => {
                for (key, child) in children {
                    prefix.push(key.clone());
                    walk(prefix, child, paths);
                    prefix.pop();
                }
            }
            ScriptNode::Steps(_) => paths.push(prefix.join(".")),
            ScriptNode::Invalid(_) => {}
        }
    }

    let mut paths = Vec::new();
    for (name, node) in scripts {
        let mut prefix = vec![name.clone()];
        walk(&mut prefix, node, &mut paths);
    }
    paths.sort();
    paths
}
