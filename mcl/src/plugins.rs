//! Plugin discovery.
//!
//! A plugin is any executable named `mcl-<name>` on `PATH`; `mcl <name> ...`
//! runs it with the remaining arguments when no script of that name exists.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File name prefix identifying plugin executables.
pub const PLUGIN_PREFIX: &str = "mcl-";

/// Find plugins on `PATH`, keyed by plugin name.
#[must_use]
pub fn discover_plugins() -> BTreeMap<String, PathBuf> {
    std::env::var_os("PATH")
        .map(|path| discover_in(std::env::split_paths(&path)))
        .unwrap_or_default()
}

/// Find plugins in `dirs`; the first directory providing a name wins.
pub fn discover_in(dirs: impl IntoIterator<Item = PathBuf>) -> BTreeMap<String, PathBuf> {
    let mut plugins = BTreeMap::new();

    for dir in dirs {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Skipping {}: {e}", dir.display());
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = plugin_name(&path) else {
                continue;
            };
            if !is_executable(&path) || plugins.contains_key(&name) {
                continue;
            }
            tracing::debug!("Found plugin '{name}' at {}", path.display());
            plugins.insert(name, path);
        }
    }

    plugins
}

/// Plugin name for an executable path, e.g. `mcl-docker` -> `docker`.
fn plugin_name(path: &Path) -> Option<String> {
    let stem = if cfg!(windows) {
        path.file_stem()
    } else {
        path.file_name()
    };
    let name = stem.and_then(OsStr::to_str)?.strip_prefix(PLUGIN_PREFIX)?;
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "exe" | "cmd" | "bat"))
}

/// Look up a single plugin by name.
#[must_use]
pub fn find_plugin(name: &str) -> Option<PathBuf> {
    which::which(format!("{PLUGIN_PREFIX}{name}")).ok()
}

/// Run a plugin with `args` and return its exit code.
///
/// # Errors
///
/// Returns `Err` if the plugin cannot be started.
pub fn run_plugin(path: &Path, args: &[String]) -> Result<i32> {
    tracing::debug!("Running plugin {} {:?}", path.display(), args);
    let status = Command::new(path)
        .args(args)
        .status()
        .map_err(|source| Error::Spawn {
            program: path.display().to_string(),
            source,
        })?;

    status
        .code()
        .ok_or_else(|| Error::Plugin(format!("Plugin {} terminated by signal", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_name() {
        assert_eq!(
            plugin_name(Path::new("/usr/bin/mcl-docker")),
            Some("docker".to_string())
        );
        assert_eq!(plugin_name(Path::new("/usr/bin/mcl-")), None);
        assert_eq!(plugin_name(Path::new("/usr/bin/docker")), None);
    }

    #[cfg(unix)]
    fn write_executable(dir: &Path, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        assert!(fs::write(&path, "#!/bin/sh\nexit 0\n").is_ok());
        assert!(fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).is_ok());
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_in_prefers_earlier_dirs() {
        let (Ok(first), Ok(second)) = (tempfile::TempDir::new(), tempfile::TempDir::new()) else {
            panic!("failed to create temp dirs");
        };
        let winner = write_executable(first.path(), "mcl-deploy");
        write_executable(second.path(), "mcl-deploy");
        write_executable(second.path(), "mcl-lint");
        write_executable(second.path(), "unrelated");
        assert!(fs::write(second.path().join("mcl-notes"), "not executable").is_ok());

        let plugins = discover_in([
            first.path().to_path_buf(),
            second.path().join("missing"),
            second.path().to_path_buf(),
        ]);

        assert_eq!(
            plugins.keys().cloned().collect::<Vec<_>>(),
            vec!["deploy".to_string(), "lint".to_string()]
        );
        assert_eq!(plugins.get("deploy"), Some(&winner));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_plugin_returns_exit_code() {
        let Ok(dir) = tempfile::TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let path = dir.path().join("mcl-status");
        assert!(fs::write(&path, "#!/bin/sh\nexit $#\n").is_ok());
        {
            use std::os::unix::fs::PermissionsExt;
            assert!(fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).is_ok());
        }

        let code = run_plugin(&path, &["a".to_string(), "b".to_string()]);
        assert_eq!(code.ok(), Some(2));
    }
}
