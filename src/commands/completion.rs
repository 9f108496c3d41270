//! Completion command
//!
//! Shell completions for every subcommand and the shared build-root flags.
//! Install with e.g. `hecbuild completion bash > ~/.local/share/bash-completion/completions/hecbuild`.

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io::{self, Write};

const BIN_NAME: &str = "hecbuild";

/// Completion script for `shell`
fn render(shell: Shell) -> Vec<u8> {
    let mut cli = crate::Cli::command();
    let mut script = Vec::new();
    generate(shell, &mut cli, BIN_NAME, &mut script);
    script
}

/// Write the completion script for `shell` to stdout.
pub(crate) fn run(shell: Shell) -> Result<()> {
    let script = render(shell);
    hecbuild::debug!("{shell} completion script is {} bytes", script.len());

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&script)
        .and_then(|()| stdout.flush())
        .with_context(|| format!("Failed to write {shell} completion script"))
}
