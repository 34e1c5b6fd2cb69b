//! Open the global configuration in the user's editor.

use crate::config;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Editor command from `EDITOR`, falling back to the platform default.
#[must_use]
pub fn editor_command() -> String {
    match std::env::var("EDITOR") {
        Ok(editor) if !editor.trim().is_empty() => editor,
        _ if cfg!(target_os = "windows") => "notepad".to_string(),
        _ => "nano".to_string(),
    }
}

/// Split an editor command such as `code --wait` into program and arguments.
///
/// Words follow POSIX shell quoting, so `'/opt/My Editor/ed' -w` keeps the
/// quoted path as one word.
///
/// # Errors
///
/// Returns `Err` if the command is empty or has an unterminated quote.
pub fn split_editor_command(editor: &str) -> Result<(String, Vec<String>)> {
    let mut words = split_shell_words(editor)
        .ok_or_else(|| Error::Editor(format!("Invalid EDITOR command: {editor}")))?
        .into_iter();
    let program = words
        .next()
        .ok_or_else(|| Error::Editor("EDITOR command cannot be empty".to_string()))?;
    Ok((program, words.collect()))
}

/// Shell-style word splitting; `None` on an unterminated quote or trailing `\`.
fn split_shell_words(line: &str) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Normal,
        SingleQuoted,
        DoubleQuoted,
    }

    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut mode = Mode::Normal;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match mode {
            Mode::Normal => match ch {
                '\'' => {
                    mode = Mode::SingleQuoted;
                    in_word = true;
                }
                '"' => {
                    mode = Mode::DoubleQuoted;
                    in_word = true;
                }
                '\\' => {
                    current.push(chars.next()?);
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
            Mode::SingleQuoted => match ch {
                '\'' => mode = Mode::Normal,
                c => current.push(c),
            },
            Mode::DoubleQuoted => match ch {
                '"' => mode = Mode::Normal,
                '\\' => match chars.peek() {
                    Some(&next @ ('\\' | '"' | '$' | '`')) => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push('\\'),
                },
                c => current.push(c),
            },
        }
    }

    if mode != Mode::Normal {
        return None;
    }
    if in_word {
        words.push(current);
    }
    Some(words)
}

/// Open `path` with `editor` and wait for it to exit.
///
/// # Errors
///
/// Returns `Err` if the editor cannot be found or started, or exits unsuccessfully.
pub fn open_in_editor(editor: &str, path: &Path) -> Result<()> {
    let (program, args) = split_editor_command(editor)?;

    let resolved: PathBuf = which::which(&program).map_err(|_| {
        tracing::warn!("Editor '{program}' not found");
        Error::Editor(format!("Editor '{program}' not found"))
    })?;

    let status = Command::new(&resolved)
        .args(&args)
        .arg(path)
        .status()
        .map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;

    if !status.success() {
        let code = status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        tracing::warn!("Editor process exited with code {code}");
        return Err(Error::Editor(format!("Editor exited with status {code}")));
    }

    Ok(())
}

/// Open `~/.mcl/global-mcl.json`, creating it with defaults first if needed.
///
/// Returns the path that was opened.
///
/// # Errors
///
/// Returns `Err` if the config cannot be created or the editor fails.
pub fn edit_global() -> Result<PathBuf> {
    config::ensure_global_dir()?;
    let path = config::global_config_path()?;
    if !path.exists() {
        config::save_config(&config::default_config(), &path)?;
    }

    let editor = editor_command();
    open_in_editor(&editor, &path)?;
    tracing::info!("Opened global config in editor {editor}");
    Ok(path)
}
