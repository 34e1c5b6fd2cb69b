//! # mcl
//!
//! My Command Line: a personal script runner. Scripts and variables live in a
//! global `~/.mcl/global-mcl.json` and an optional project `./mcl.json`; a
//! script may nest subcommands and use `$1`, `?$1` and `$name` placeholders.

pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod executor;
pub mod plugins;
pub mod prompt;
pub mod resolver;
pub mod script;
pub mod template;

pub use error::{Error, Result};

/// Print an error message and exit with code 1.
pub fn fatal_error(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}
