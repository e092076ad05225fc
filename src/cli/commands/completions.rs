//! Completions command - print a shell completion script for vidnote.

use std::io::Write;

use clap::Command;
use clap_complete::{generate, Shell};

/// Arguments for the completions command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    vidnote completions bash > ~/.local/share/bash-completion/completions/vidnote\n    \
    vidnote completions zsh > ~/.zfunc/_vidnote\n    \
    vidnote completions fish > ~/.config/fish/completions/vidnote.fish")]
pub struct Args {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL", value_enum)]
    pub shell: Shell,
}

/// Writes the completion script for `cmd` to `out`.
///
/// main.rs owns the `Cli` definition and passes its command in.
pub fn write_completions(cmd: &mut Command, shell: Shell, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(shell, cmd, name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_names_the_subcommands() {
        let mut cmd = Command::new("vidnote")
            .subcommand(Command::new("compose"))
            .subcommand(Command::new("export"));
        let mut out = Vec::new();
        write_completions(&mut cmd, Shell::Bash, &mut out);

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("vidnote"));
        assert!(script.contains("compose"));
        assert!(script.contains("export"));
    }
}
