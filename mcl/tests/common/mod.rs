//! Common test helpers shared across integration tests

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)] // Not all helpers are used by every test file

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Helper to get the compiled binary path
pub fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mcl"))
}

/// Helper to create a temporary directory for tests
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// A project directory plus an isolated home directory for one test.
pub struct Sandbox {
    pub project: tempfile::TempDir,
    pub home: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            project: create_temp_dir(),
            home: create_temp_dir(),
        }
    }

    /// Write `./mcl.json` in the project directory
    pub fn write_local(&self, content: &str) {
        fs::write(self.project.path().join("mcl.json"), content).unwrap();
    }

    /// Write `~/.mcl/global-mcl.json` in the isolated home
    pub fn write_global(&self, content: &str) {
        let dir = self.home.path().join(".mcl");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("global-mcl.json"), content).unwrap();
    }

    pub fn local_path(&self) -> PathBuf {
        self.project.path().join("mcl.json")
    }

    /// Command running in the project directory with the isolated home.
    /// Stdin is closed so the run is never interactive.
    pub fn command(&self) -> Command {
        test_command(&get_binary_path(), self.project.path(), self.home.path())
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("Failed to execute command")
    }
}

/// Helper to create a Command with test environment
pub fn test_command(binary: &Path, cwd: &Path, home: &Path) -> Command {
    let mut cmd = Command::new(binary);
    cmd.current_dir(cwd)
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("MCL_SHELL")
        .env_remove("MCL_LOG")
        .stdin(Stdio::null());
    cmd
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Package version for testing --version flag
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
