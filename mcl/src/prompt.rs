//! Interactive selection used when a script needs a subcommand that was not given.

use std::io::{self, BufRead, IsTerminal, Write};

/// Capability the resolver uses to ask the user for a missing subcommand.
pub trait Prompt {
    /// Whether a user is available to answer a prompt.
    fn is_interactive(&self) -> bool;

    /// Ask the user to pick one of `options`. `None` means the user gave up.
    fn select(&self, title: &str, options: &[String]) -> Option<String>;
}

/// Never interactive; used for piped or scripted invocations.
pub struct NonInteractive;

impl Prompt for NonInteractive {
    fn is_interactive(&self) -> bool {
        false
    }

    fn select(&self, _title: &str, _options: &[String]) -> Option<String> {
        None
    }
}

/// Numbered menu on stderr, answered on stdin.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal() && io::stdout().is_terminal()
    }

    fn select(&self, title: &str, options: &[String]) -> Option<String> {
        let stdin = io::stdin();
        let mut stderr = io::stderr();
        select_from(&mut stdin.lock(), &mut stderr, title, options)
    }
}

/// Menu loop over arbitrary reader/writer pairs.
///
/// Accepts either the option's number or its exact name. An empty answer,
/// `q`, end of input or a read error cancel the selection.
pub fn select_from(
    input: &mut impl BufRead,
    output: &mut impl Write,
    title: &str,
    options: &[String],
) -> Option<String> {
    if options.is_empty() {
        return None;
    }

    let _ = writeln!(output, "{title}");
    for (number, option) in options.iter().enumerate() {
        let _ = writeln!(output, "  {}) {option}", number + 1);
    }

    loop {
        let _ = write!(output, "Select [1-{}, q to cancel]: ", options.len());
        let _ = output.flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }

        let answer = line.trim();
        if answer.is_empty() || answer == "q" {
            return None;
        }

        if let Ok(number) = answer.parse::<usize>()
            && (1..=options.len()).contains(&number)
        {
            return Some(options[number - 1].clone());
        }

        if let Some(option) = options.iter().find(|option| option.as_str() == answer) {
            return Some(option.clone());
        }

        let _ = writeln!(output, "Invalid choice '{answer}'");
    }
}
