//! Configuration discovery, merging and persistence.
//!
//! Two JSON files are layered: the global `~/.mcl/global-mcl.json` and the
//! project `./mcl.json`. Objects merge recursively; any other value from the
//! project file replaces the global one.

use crate::error::ConfigError;
use crate::script::{ScriptMap, scripts_from_object};
use serde::Deserialize;
use serde_json::{Map, Number, Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding the global config, relative to the home directory.
pub const GLOBAL_DIR_NAME: &str = ".mcl";
/// Global config file name inside [`GLOBAL_DIR_NAME`].
pub const GLOBAL_CONFIG_NAME: &str = "global-mcl.json";
/// Project config file name, looked up in the current directory.
pub const LOCAL_CONFIG_NAME: &str = "mcl.json";

/// Merged configuration for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Merged script tree.
    pub scripts: ScriptMap,
    /// Variables available as `$name` in templates.
    pub vars: BTreeMap<String, String>,
    /// Scripts as defined in the global file only.
    pub global_scripts: ScriptMap,
    /// Scripts as defined in the project file only.
    pub local_scripts: ScriptMap,
}

/// A variable value as written in JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum VarValue {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl VarValue {
    /// Numbers keep their JSON notation (`2.0` stays `2.0`, large integers stay exact).
    fn into_string(self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// Get the user's home directory in a cross-platform way.
#[must_use]
pub fn get_home_dir() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME") {
        return Some(PathBuf::from(home));
    }

    if let Some(userprofile) = std::env::var_os("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }

    if let (Some(homedrive), Some(homepath)) =
        (std::env::var_os("HOMEDRIVE"), std::env::var_os("HOMEPATH"))
    {
        let mut path = PathBuf::from(homedrive);
        path.push(homepath);
        return Some(path);
    }

    None
}

/// `~/.mcl`
///
/// # Errors
///
/// Returns `Err` if the home directory cannot be determined.
pub fn global_dir() -> Result<PathBuf, ConfigError> {
    get_home_dir()
        .map(|home| home.join(GLOBAL_DIR_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

/// `~/.mcl/global-mcl.json`
///
/// # Errors
///
/// Returns `Err` if the home directory cannot be determined.
pub fn global_config_path() -> Result<PathBuf, ConfigError> {
    Ok(global_dir()?.join(GLOBAL_CONFIG_NAME))
}

/// `./mcl.json`
///
/// # Errors
///
/// Returns `Err` if the current directory cannot be determined.
pub fn local_config_path() -> Result<PathBuf, ConfigError> {
    std::env::current_dir()
        .map(|cwd| cwd.join(LOCAL_CONFIG_NAME))
        .map_err(|source| ConfigError::CurrentDir { source })
}

/// Create `~/.mcl` if it does not exist yet.
///
/// # Errors
///
/// Returns `Err` if the home directory is unknown or the directory cannot be created.
pub fn ensure_global_dir() -> Result<PathBuf, ConfigError> {
    let dir = global_dir()?;
    fs::create_dir_all(&dir).map_err(|source| ConfigError::Write {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

/// Configuration written by `mcl init` and for a fresh global file.
#[must_use]
pub fn default_config() -> Value {
    json!({"vars": {}, "scripts": {}})
}

/// Read a JSON object from `path`.
fn load_json(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Recursively merge `overlay` into `base`.
pub fn merge_values(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match value {
            Value::Object(incoming) => {
                if let Some(Value::Object(existing)) = base.get_mut(&key) {
                    merge_values(existing, incoming);
                    continue;
                }
                base.insert(key, Value::Object(incoming));
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// The `scripts` object of a single file, or empty if absent or not an object.
fn file_scripts(data: &Map<String, Value>) -> ScriptMap {
    match data.get("scripts") {
        Some(Value::Object(scripts)) => scripts_from_object(scripts),
        _ => ScriptMap::new(),
    }
}

/// Build a [`Config`] from already-parsed global and project objects.
///
/// # Errors
///
/// Returns `Err` if the merged `scripts`/`vars` are not objects or a variable
/// is not a scalar.
pub fn build_config(
    global: Option<Map<String, Value>>,
    local: Option<Map<String, Value>>,
) -> Result<Config, ConfigError> {
    let mut merged = match default_config() {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let global_scripts = global.as_ref().map(file_scripts).unwrap_or_default();
    let local_scripts = local.as_ref().map(file_scripts).unwrap_or_default();

    if let Some(global) = global {
        merge_values(&mut merged, global);
    }
    if let Some(local) = local {
        merge_values(&mut merged, local);
    }

    let Some(Value::Object(scripts)) = merged.get("scripts") else {
        return Err(ConfigError::InvalidSection { key: "scripts" });
    };
    let scripts = scripts_from_object(scripts);

    let Some(Value::Object(raw_vars)) = merged.remove("vars") else {
        return Err(ConfigError::InvalidSection { key: "vars" });
    };
    let mut vars = BTreeMap::new();
    for (name, value) in raw_vars {
        let value = VarValue::deserialize(value)
            .map_err(|_| ConfigError::InvalidVariable { name: name.clone() })?;
        vars.insert(name, value.into_string());
    }

    Ok(Config {
        scripts,
        vars,
        global_scripts,
        local_scripts,
    })
}

/// Load the global config and, when `include_local` is set, layer `./mcl.json` on top.
///
/// Missing files are treated as empty.
///
/// # Errors
///
/// Returns `Err` if a file cannot be read, is not valid JSON, is not an
/// object, or the merged result is not a valid configuration.
pub fn load_config(include_local: bool) -> Result<Config, ConfigError> {
    ensure_global_dir()?;

    let global_path = global_config_path()?;
    let global = if global_path.exists() {
        tracing::debug!("Loading global config from {}", global_path.display());
        Some(load_json(&global_path)?)
    } else {
        None
    };

    let mut local = None;
    if include_local {
        let local_path = local_config_path()?;
        if local_path.exists() {
            tracing::debug!("Loading local config from {}", local_path.display());
            local = Some(load_json(&local_path)?);
        }
    }

    build_config(global, local)
}

/// Write `config` to `path` as 4-space indented JSON with a trailing newline.
///
/// # Errors
///
/// Returns `Err` if the file cannot be written.
pub fn save_config(config: &Value, path: &Path) -> Result<(), ConfigError> {
    let write_err = |source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(config, &mut serializer).map_err(|e| write_err(e.into()))?;
    buf.push(b'\n');

    fs::write(path, buf).map_err(write_err)?;
    tracing::debug!("Saved configuration to {}", path.display());
    Ok(())
}

/// Create an empty `mcl.json` in the current directory without overwriting.
///
/// Returns the path and whether a new file was written.
///
/// # Errors
///
/// Returns `Err` if the file cannot be written.
pub fn init_local() -> Result<(PathBuf, bool), ConfigError> {
    let path = local_config_path()?;
    if path.exists() {
        tracing::warn!("Local config already exists at {}", path.display());
        return Ok((path, false));
    }

    save_config(&default_config(), &path)?;
    tracing::info!("Created new local config at {}", path.display());
    Ok((path, true))
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::script::ScriptNode;
    use serial_test::serial;
    use std::env;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_defaults_when_nothing_loaded() {
        let config = build_config(None, None);
        assert_eq!(config.ok(), Some(Config::default()));
    }

    #[test]
    fn test_local_overrides_global() {
        let global = object(json!({
            "scripts": {"echo": ["echo global"], "nested": {"a": "echo a"}},
            "vars": {"env": "prod", "region": "eu"}
        }));
        let local = object(json!({
            "scripts": {"echo": ["echo local"], "build": ["echo build"], "nested": {"b": "echo b"}},
            "vars": {"env": "local"}
        }));

        let config = match build_config(Some(global), Some(local)) {
            Ok(config) => config,
            Err(err) => panic!("unexpected error: {err}"),
        };

        assert_eq!(
            config.scripts.get("echo"),
            Some(&ScriptNode::Steps(vec!["echo local".to_string()]))
        );
        assert!(config.scripts.contains_key("build"));
        let Some(ScriptNode::Branch(nested)) = config.scripts.get("nested") else {
            panic!("expected nested branch");
        };
        assert_eq!(
            nested.keys().collect::<Vec<_>>(),
            vec![&"a".to_string(), &"b".to_string()]
        );
        assert_eq!(config.vars.get("env").map(String::as_str), Some("local"));
        assert_eq!(config.vars.get("region").map(String::as_str), Some("eu"));
        assert_eq!(config.global_scripts.len(), 2);
        assert_eq!(config.local_scripts.len(), 3);
    }

    #[test]
    fn test_scalar_vars_are_stringified() {
        let local = object(json!({"vars": {"port": 8080, "debug": true, "ratio": 0.5}}));
        let config = build_config(None, Some(local));
        let vars = config.map(|c| c.vars).unwrap_or_default();
        assert_eq!(vars.get("port").map(String::as_str), Some("8080"));
        assert_eq!(vars.get("debug").map(String::as_str), Some("true"));
        assert_eq!(vars.get("ratio").map(String::as_str), Some("0.5"));
    }

    #[test]
    fn test_numeric_vars_keep_json_notation() {
        let local: Map<String, Value> = match serde_json::from_str(
            r#"{"vars": {"version": 2.0, "huge": 18446744073709551615, "neg": -3}}"#,
        ) {
            Ok(map) => map,
            Err(err) => panic!("invalid JSON: {err}"),
        };
        let config = build_config(None, Some(local));
        let vars = config.map(|c| c.vars).unwrap_or_default();
        assert_eq!(vars.get("version").map(String::as_str), Some("2.0"));
        assert_eq!(
            vars.get("huge").map(String::as_str),
            Some("18446744073709551615")
        );
        assert_eq!(vars.get("neg").map(String::as_str), Some("-3"));
    }

    #[test]
    fn test_non_scalar_var_is_rejected() {
        let local = object(json!({"vars": {"list": [1, 2]}}));
        assert!(matches!(
            build_config(None, Some(local)),
            Err(ConfigError::InvalidVariable { ref name }) if name == "list"
        ));
    }

    #[test]
    fn test_scripts_must_be_object() {
        let local = object(json!({"scripts": ["echo"]}));
        assert!(matches!(
            build_config(None, Some(local)),
            Err(ConfigError::InvalidSection { key: "scripts" })
        ));
    }

    #[test]
    fn test_merge_replaces_non_objects() {
        let mut base = object(json!({"a": {"x": 1}, "b": [1]}));
        merge_values(&mut base, object(json!({"a": {"y": 2}, "b": [2]})));
        assert_eq!(Value::Object(base), json!({"a": {"x": 1, "y": 2}, "b": [2]}));
    }

    #[test]
    fn test_load_json_rejects_invalid_and_non_object() {
        let Ok(dir) = tempfile::TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let invalid = dir.path().join("invalid.json");
        let array = dir.path().join("array.json");
        assert!(fs::write(&invalid, "{invalid}").is_ok());
        assert!(fs::write(&array, "[1, 2]").is_ok());

        assert!(matches!(load_json(&invalid), Err(ConfigError::Parse { .. })));
        assert!(matches!(load_json(&array), Err(ConfigError::NotAnObject { .. })));
    }

    #[test]
    fn test_save_config_uses_four_space_indent() {
        let Ok(dir) = tempfile::TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let path = dir.path().join("mcl.json");
        assert!(save_config(&default_config(), &path).is_ok());

        let written = fs::read_to_string(&path).unwrap_or_default();
        assert!(written.contains("\n    \"scripts\": {}"));
        assert!(written.ends_with("}\n"));
    }

    #[test]
    #[serial]
    fn test_init_local_does_not_overwrite() {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let original_cwd = env::current_dir().expect("Failed to get current directory");
        env::set_current_dir(temp.path()).expect("Failed to change CWD");

        let first = init_local().expect("init should succeed");
        let second = init_local().expect("init should succeed");
        let written = fs::read_to_string(LOCAL_CONFIG_NAME).expect("mcl.json should exist");

        env::set_current_dir(original_cwd).expect("Failed to restore CWD");

        assert!(first.1);
        assert!(!second.1);
        assert_eq!(first.0.file_name(), second.0.file_name());
        let value: Value = serde_json::from_str(&written).expect("valid JSON");
        assert_eq!(value, default_config());
    }

    #[cfg(target_os = "linux")]
    #[test]
    #[serial]
    fn test_missing_current_dir_is_reported() {
        let original_cwd = env::current_dir().expect("Failed to get current directory");
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let doomed = temp.path().join("gone");
        fs::create_dir(&doomed).expect("Failed to create dir");
        env::set_current_dir(&doomed).expect("Failed to change CWD");
        fs::remove_dir(&doomed).expect("Failed to remove CWD");

        let local = local_config_path();
        let init = init_local();

        env::set_current_dir(original_cwd).expect("Failed to restore CWD");

        assert!(matches!(local, Err(ConfigError::CurrentDir { .. })));
        assert!(matches!(init, Err(ConfigError::CurrentDir { .. })));
    }
}
