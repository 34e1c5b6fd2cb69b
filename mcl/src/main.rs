//! # mcl
//!
//! Run scripts defined in JSON config files from the command line.
//!
//! ## Usage
//!
//! - Run a script: `mcl build`, `mcl run build`
//! - Select a nested script: `mcl example date utc`
//! - Pass arguments: `mcl greet Alice` (available as `$1` in the script)
//! - Preview without running: `mcl --dry-run deploy prod`
//! - Create a project config: `mcl init`
//! - Edit the global config: `mcl edit`

/// Entry point for the CLI tool.
fn main() {
    mcl::cli::run_cli();
}
