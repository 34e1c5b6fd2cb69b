//! Script resolution: walk a script tree using leading arguments as keys.

use crate::error::ScriptError;
use crate::prompt::Prompt;
use crate::script::{ScriptMap, ScriptNode, format_path};
use std::collections::VecDeque;

/// Name of the namespace retried when a script is not found at the top level.
pub const RUN_NAMESPACE: &str = "run";

/// Outcome of walking a script tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Raw command templates of the selected leaf.
    pub steps: Vec<String>,
    /// Arguments left after dispatch, used as positional values.
    pub remaining: Vec<String>,
    /// Path-qualified name of the selected leaf, e.g. `example.date.utc`.
    pub path: String,
}

/// Walk `node`, consuming leading `args` as branch keys.
///
/// When a branch is reached with no arguments left, `prompt` is asked to pick
/// a key if it is interactive; otherwise the script is ambiguous.
///
/// # Errors
///
/// Returns `Err` if:
/// - A branch needs a key, none was given and the prompt is not interactive
/// - The interactive selection is cancelled
/// - A given key does not exist in the branch
/// - The selected leaf is not a string or an array of strings
pub fn resolve(
    node: &ScriptNode,
    args: &[String],
    script_name: &str,
    prompt: &dyn Prompt,
) -> Result<Resolution, ScriptError> {
    let mut current = node;
    let mut remaining: VecDeque<String> = args.iter().cloned().collect();
    let mut path: Vec<String> = Vec::new();

    loop {
        let children = match current {
            ScriptNode::Branch(children) => children,
            ScriptNode::Steps(steps) => {
                return Ok(Resolution {
                    steps: steps.clone(),
                    remaining: remaining.into(),
                    path: format_path(script_name, &path),
                });
            }
            ScriptNode::Invalid(found) => {
                return Err(ScriptError::MalformedScript {
                    script: format_path(script_name, &path),
                    found: *found,
                });
            }
        };
        let available: Vec<String> = children.keys().cloned().collect();

        let key = match remaining.pop_front() {
            Some(key) => key,
            None if prompt.is_interactive() => {
                let title = format!(
                    "Script '{}' requires a subcommand:",
                    format_path(script_name, &path)
                );
                prompt
                    .select(&title, &available)
                    .ok_or_else(|| ScriptError::Cancelled {
                        script: format_path(script_name, &path),
                    })?
            }
            None => {
                return Err(ScriptError::AmbiguousScript {
                    script: format_path(script_name, &path),
                    available,
                });
            }
        };

        let Some(child) = children.get(&key) else {
            return Err(ScriptError::UnknownSubcommand {
                script: format_path(script_name, &path),
                key,
                available,
            });
        };

        tracing::debug!("Resolved '{}' -> '{key}'", format_path(script_name, &path));
        path.push(key);
        current = child;
    }
}

/// Look up `name` in `scripts` and resolve it against `args`.
///
/// If `name` is not a top-level script but is a key of a top-level `run`
/// branch, resolution is retried once from that branch with `name` put back
/// in front of the arguments.
///
/// # Errors
///
/// Returns `Err` if the script cannot be found or [`resolve`] fails.
pub fn resolve_script(
    scripts: &ScriptMap,
    name: &str,
    args: &[String],
    prompt: &dyn Prompt,
) -> Result<Resolution, ScriptError> {
    if let Some(node) = scripts.get(name) {
        return resolve(node, args, name, prompt);
    }

    if let Some(run_node) = scripts.get(RUN_NAMESPACE)
        && let ScriptNode::Branch(children) = run_node
        && children.contains_key(name)
    {
        tracing::debug!("Script '{name}' not found; retrying under '{RUN_NAMESPACE}'");
        let mut retried = Vec::with_capacity(args.len() + 1);
        retried.push(name.to_string());
        retried.extend_from_slice(args);
        return resolve(run_node, &retried, RUN_NAMESPACE, prompt);
    }

    Err(ScriptError::ScriptNotFound {
        name: name.to_string(),
    })
}
