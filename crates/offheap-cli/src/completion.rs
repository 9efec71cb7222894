//! Shell completion generation.

use std::io;

use clap::Command;
use clap_complete::{generate, Shell};

/// Name completions are registered under.
pub const BIN_NAME: &str = "offheap";

/// Write a completion script for `shell` to `out`.
pub fn generate_completion(cmd: &mut Command, shell: Shell, out: &mut dyn io::Write) {
    generate(shell, cmd, BIN_NAME, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        Command::new(BIN_NAME).arg(clap::Arg::new("capacity").long("capacity"))
    }

    #[test]
    fn bash_completion_mentions_flags() {
        let mut buf = Vec::new();
        generate_completion(&mut command(), Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("--capacity"));
    }

    #[test]
    fn zsh_completion_not_empty() {
        let mut buf = Vec::new();
        generate_completion(&mut command(), Shell::Zsh, &mut buf);
        assert!(!buf.is_empty());
    }
}
