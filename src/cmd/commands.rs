/*!
`commands.rs`

Implements `lightning commands`: describe the commands installed for the
app this shell is connected to, read back from the stored manifest.

Output:
  <Title> App

  Description:
    <app description>

  Commands:
    command with client    A command with a client.
    nested command         A nested command.
*/

use anyhow::Result;
use clap::Args;
use std::io::{self, Write};

use crate::cmd::format::{command_listing, pretty_command_name};
use crate::cmd::shared::NOT_CONNECTED;
use crate::config::Settings;
use crate::connection::ConnectionStore;

/// CLI arguments for `lightning commands`
#[derive(Args, Debug, Default)]
pub struct CommandsArgs {}

/// Entry point for the commands subcommand.
pub fn execute_commands(_args: CommandsArgs, settings: &Settings) -> Result<()> {
    let store = ConnectionStore::new(&settings.connection_root, &settings.ppid);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    list_app_commands(&store, &mut out)?;
    Ok(())
}

/// Print the connected app's commands; returns their display names, sorted.
pub fn list_app_commands(store: &ConnectionStore, out: &mut dyn Write) -> Result<Vec<String>> {
    if store.current()?.is_none() {
        writeln!(out, "{NOT_CONNECTED}")?;
        return Ok(Vec::new());
    }

    let manifest = store.read_metadata()?.unwrap_or_default();
    if manifest.is_empty() {
        writeln!(out, "The current Lightning App doesn't have commands.")?;
        return Ok(Vec::new());
    }

    for line in command_listing(&manifest) {
        writeln!(out, "{line}")?;
    }

    let mut names: Vec<String> = manifest.names().map(pretty_command_name).collect();
    names.sort();
    Ok(names)
}
