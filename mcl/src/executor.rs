//! Script execution: resolve, render, then run each step in a shell.

use crate::config::Config;
use crate::error::{Error, Result, ScriptError};
use crate::prompt::Prompt;
use crate::resolver::resolve_script;
use crate::template;
use std::collections::BTreeMap;
use std::process::{Command, Stdio};

/// Prefix of the environment variables carrying positional arguments.
pub const ARG_ENV_PREFIX: &str = "MCL_ARG_";

/// Flags controlling how rendered steps are run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Log the steps without running them.
    pub dry_run: bool,
    /// Export config vars and `MCL_ARG_<n>` to the child processes.
    pub share_vars: bool,
}

/// Result of preparing a script for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Path-qualified script name.
    pub script: String,
    /// Rendered, shell-ready command lines.
    pub steps: Vec<String>,
    /// Extra environment for the child processes.
    pub env: BTreeMap<String, String>,
}

/// Resolve and render `name` without running anything.
///
/// # Errors
///
/// Returns `Err` if resolution or rendering fails.
pub fn plan(
    config: &Config,
    name: &str,
    args: &[String],
    share_vars: bool,
    prompt: &dyn Prompt,
) -> std::result::Result<Plan, ScriptError> {
    let resolution = resolve_script(&config.scripts, name, args, prompt)?;
    let steps = template::render(&resolution.steps, &resolution.remaining, &config.vars)
        .map_err(|source| ScriptError::Template {
            script: resolution.path.clone(),
            source,
        })?;

    let env = if share_vars {
        shared_environment(&config.vars, &resolution.remaining)
    } else {
        BTreeMap::new()
    };

    Ok(Plan {
        script: resolution.path,
        steps,
        env,
    })
}

/// Config vars plus `MCL_ARG_1..n` for each positional argument.
#[must_use]
pub fn shared_environment(
    vars: &BTreeMap<String, String>,
    args: &[String],
) -> BTreeMap<String, String> {
    let mut env = vars.clone();
    for (index, arg) in args.iter().enumerate() {
        env.insert(format!("{ARG_ENV_PREFIX}{}", index + 1), arg.clone());
    }
    env
}

/// Run the script `name` from `config` with `args`.
///
/// Steps run one at a time; the first failing step aborts the rest.
///
/// # Errors
///
/// Returns `Err` if the script cannot be resolved or rendered, a shell cannot
/// be started, or a step exits with a non-zero status.
pub fn execute(
    config: &Config,
    name: &str,
    args: &[String],
    options: ExecuteOptions,
    prompt: &dyn Prompt,
) -> Result<()> {
    let plan = plan(config, name, args, options.share_vars, prompt)?;

    if plan.steps.is_empty() {
        tracing::info!("No executable steps for script '{}'", plan.script);
        return Ok(());
    }

    for step in &plan.steps {
        tracing::info!("Executing step: {step}");
        if options.dry_run {
            tracing::info!("Dry-run enabled; skipping execution");
            continue;
        }
        run_shell_command(step, &plan.env)?;
    }

    Ok(())
}

/// Shell used to run steps: `MCL_SHELL`, else PowerShell on Windows, else `sh`.
///
/// Returns the program and the flag that introduces the command string.
#[must_use]
pub fn shell_command() -> (String, &'static str) {
    if let Ok(custom_shell) = std::env::var("MCL_SHELL")
        && !custom_shell.trim().is_empty()
    {
        let flag = if is_powershell(&custom_shell) {
            "-Command"
        } else {
            "-c"
        };
        return (custom_shell, flag);
    }

    if cfg!(target_os = "windows") {
        // Prefer PowerShell 7+ when installed
        if which::which("pwsh").is_ok() {
            ("pwsh".to_string(), "-Command")
        } else {
            ("powershell".to_string(), "-Command")
        }
    } else {
        ("sh".to_string(), "-c")
    }
}

fn is_powershell(shell: &str) -> bool {
    let file_name = shell.rsplit(['/', '\\']).next().unwrap_or(shell);
    let name = file_name.strip_suffix(".exe").unwrap_or(file_name);
    matches!(name, "pwsh" | "powershell")
}

/// Run a single command line with inherited stdio.
///
/// # Errors
///
/// Returns `Err` if the shell cannot be started or the command fails.
pub fn run_shell_command(command: &str, env: &BTreeMap<String, String>) -> Result<()> {
    let (shell, flag) = shell_command();

    let status = Command::new(&shell)
        .arg(flag)
        .arg(command)
        .envs(env)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| Error::Spawn {
            program: shell.clone(),
            source,
        })?;

    if !status.success() {
        return Err(Error::CommandFailed {
            command: command.to_string(),
            code: status.code(),
        });
    }

    Ok(())
}
