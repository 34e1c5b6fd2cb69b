//! CLI module containing the main entry point logic.

use crate::config::{self, Config};
use crate::error::{Error, Result, ScriptError};
use crate::executor::{self, ExecuteOptions};
use crate::prompt::TerminalPrompt;
use crate::{editor, plugins, script};
use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use std::collections::BTreeSet;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "MCL_LOG";

const USAGE_TIP: &str = "Tip: use `mcl run <script>` or shorthand `mcl <script> [args...]`.";

/// CLI arguments for mcl.
#[derive(ClapParser)]
#[command(name = "mcl")]
#[command(version = PKG_VERSION)]
#[command(about = "Run scripts defined in ~/.mcl/global-mcl.json and ./mcl.json", long_about = None)]
#[command(allow_external_subcommands = true)]
struct Cli {
    /// Print commands without executing them
    #[arg(long)]
    dry_run: bool,

    /// Expose config vars and args to subprocesses via the environment
    #[arg(long)]
    share_vars: bool,

    /// List all available scripts
    #[arg(short, long)]
    list: bool,

    /// Increase log verbosity (-v for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty `mcl.json` in the current directory
    Init,

    /// Open the global configuration file in the configured editor
    Edit,

    /// Execute the configured script with optional arguments
    Run {
        /// Script to run
        #[arg(value_name = "SCRIPT")]
        script: String,

        /// Subcommands and positional arguments for the script
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List installed plugins (`mcl-<name>` executables on PATH)
    Plugins,

    /// Shorthand for `run <SCRIPT> [ARGS...]`, or a plugin
    #[command(external_subcommand)]
    External(Vec<String>),
}

impl Cli {
    fn options(&self) -> ExecuteOptions {
        ExecuteOptions {
            dry_run: self.dry_run,
            share_vars: self.share_vars,
        }
    }
}

/// Main CLI logic.
pub fn run_cli() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => crate::fatal_error(&format!("Error: {e}")),
    }
}

/// Install the stderr log subscriber. `MCL_LOG` overrides the level.
fn init_logging(verbose: u8) {
    let default_level = if verbose > 0 { "mcl=debug" } else { "mcl=info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}

/// Run the parsed command and return the process exit code.
fn dispatch(cli: Cli) -> Result<i32> {
    let options = cli.options();

    if cli.list {
        let config = config::load_config(true)?;
        print_script_list(&config);
        return Ok(0);
    }

    match cli.command {
        None => {
            print_usage();
            Ok(0)
        }
        Some(Commands::Init) => {
            let (path, created) = config::init_local()?;
            if created {
                println!("Local config ready at {}", config::LOCAL_CONFIG_NAME);
            } else {
                println!("Local config already exists at {}", path.display());
            }
            Ok(0)
        }
        Some(Commands::Edit) => {
            let path = editor::edit_global()?;
            println!("Opened {}", path.display());
            Ok(0)
        }
        Some(Commands::Plugins) => {
            print_plugins();
            Ok(0)
        }
        Some(Commands::Run { script, args }) => {
            run_script(&script, &args, options, false)
        }
        Some(Commands::External(mut words)) => {
            if words.is_empty() {
                print_usage();
                return Ok(0);
            }
            let name = words.remove(0);
            run_script(&name, &words, options, true)
        }
    }
}

/// Run a script by name; optionally fall back to a plugin when no script matches.
fn run_script(
    name: &str,
    args: &[String],
    options: ExecuteOptions,
    allow_plugin: bool,
) -> Result<i32> {
    let config = config::load_config(true)?;

    match executor::execute(&config, name, args, options, &TerminalPrompt) {
        Ok(()) => {
            println!("Command '{name}' completed");
            Ok(0)
        }
        Err(Error::Script(ScriptError::ScriptNotFound { .. })) if allow_plugin => {
            let Some(plugin) = plugins::find_plugin(name) else {
                return Err(ScriptError::ScriptNotFound {
                    name: name.to_string(),
                }
                .into());
            };
            plugins::run_plugin(&plugin, args)
        }
        Err(e) => Err(e),
    }
}

fn print_script_list(config: &Config) {
    let paths = script::list_paths(&config.scripts);
    if paths.is_empty() {
        println!("No scripts configured yet. Try `mcl init`.");
        return;
    }
    println!("Available scripts:");
    for path in paths {
        println!("  {path}");
    }
}

fn print_plugins() {
    let found = plugins::discover_plugins();
    if found.is_empty() {
        println!("No plugins installed.");
        return;
    }
    println!("Installed plugins:");
    for (name, path) in found {
        println!("  {name}  {}", path.display());
    }
}

fn print_usage() {
    println!("{}", Cli::command().render_help());
    println!("\n{USAGE_TIP}\n");

    match config::load_config(true) {
        Ok(config) => print!("{}", script_overview(&config)),
        Err(e) => eprintln!("Warning: unable to load config ({e})"),
    }
}

/// Local and global script listings for the usage screen.
///
/// Global scripts that the project file overrides are listed only once,
/// under the local section.
#[must_use]
pub fn script_overview(config: &Config) -> String {
    let local_paths = script::list_paths(&config.local_scripts);
    let local_set: BTreeSet<&String> = local_paths.iter().collect();
    let global_paths: Vec<String> = script::list_paths(&config.global_scripts)
        .into_iter()
        .filter(|path| !local_set.contains(path))
        .collect();

    let mut out = String::new();
    if !local_paths.is_empty() {
        out.push_str("Local scripts (override global when duplicated):\n");
        for path in &local_paths {
            out.push_str(&format!("  • {path}\n"));
        }
    }

    if !global_paths.is_empty() {
        if !local_paths.is_empty() {
            out.push('\n');
        }
        out.push_str("Global scripts:\n");
        for path in &global_paths {
            out.push_str(&format!("  • {path}\n"));
        }
    }

    if local_paths.is_empty() && global_paths.is_empty() {
        out.push_str("No scripts configured yet. Try `mcl init`.\n");
    }

    out
}
