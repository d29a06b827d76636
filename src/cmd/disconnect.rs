/*!
`disconnect.rs`

Implements `lightning disconnect`: forget the app this shell is connected to
and remove its installed commands.

Output (exactly one line):
  - local app  : "You are disconnected from the local Lightning App."
  - cloud app  : "You are disconnected from the cloud Lightning App: <name>."
  - no session : the not-connected guidance
*/

use anyhow::Result;
use clap::Args;
use std::io::{self, Write};

use crate::cmd::shared::NOT_CONNECTED;
use crate::config::Settings;
use crate::connection::{Connection, ConnectionStore};

/// CLI arguments for `lightning disconnect`
#[derive(Args, Debug, Default)]
pub struct DisconnectArgs {}

/// Entry point for the disconnect subcommand.
pub fn execute_disconnect(_args: DisconnectArgs, settings: &Settings) -> Result<()> {
    let store = ConnectionStore::new(&settings.connection_root, &settings.ppid);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    disconnect(&store, &mut out)?;
    Ok(())
}

/// Clear this session's connection, echoing the outcome. Returns the
/// connection that was active, if any.
pub fn disconnect(store: &ConnectionStore, out: &mut dyn Write) -> Result<Option<Connection>> {
    store.clean_stale()?;

    let previous = store.clear()?;
    match &previous {
        Some(c) if c.is_local() => writeln!(out, "You are disconnected from the local Lightning App.")?,
        Some(c) => writeln!(out, "You are disconnected from the cloud Lightning App: {}.", c.name)?,
        None => writeln!(out, "{NOT_CONNECTED}")?,
    }
    Ok(previous)
}
