/*!
shared.rs - shared helpers for subcommands.

Focus:
  - Session: the store, platform and I/O handles a command runs against
  - block_on: temporary Tokio runtime for the sync entry points
  - confirm: yes/no prompt
  - status messages reused by several commands
*/

use anyhow::{Context, Result};
use std::future::Future;
use std::io::{BufRead, Write};

use crate::app::AppPlatform;
use crate::connection::ConnectionStore;

pub const NOT_CONNECTED: &str = "You aren't connected to any Lightning App. \
Please use `lightning connect app_name_or_id` to connect to one.";

pub const LOCAL_CONNECTED: &str = "You are connected to the local Lightning App.";

/// Everything a command touches outside its own arguments.
pub struct Session<'a> {
    pub store: &'a ConnectionStore,
    pub platform: &'a dyn AppPlatform,
    pub out: &'a mut dyn Write,
    pub input: &'a mut dyn BufRead,
}

/// Run an async command body on a fresh multi-threaded runtime.
pub fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    Ok(rt.block_on(fut))
}

/// Ask a yes/no question; anything but y/yes (case-insensitive) is a no.
pub fn confirm(out: &mut dyn Write, input: &mut dyn BufRead, question: &str) -> Result<bool> {
    write!(out, "{question} [y/N]: ")?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(matches!(answer.as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_accepts_yes() {
        let mut out = Vec::new();
        let mut input: &[u8] = b"Yes\n";
        assert!(confirm(&mut out, &mut input, "Proceed?").unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "Proceed? [y/N]: ");
    }

    #[test]
    fn confirm_defaults_to_no() {
        let mut out = Vec::new();
        let mut empty: &[u8] = b"";
        assert!(!confirm(&mut out, &mut empty, "Proceed?").unwrap());

        let mut other: &[u8] = b"maybe\n";
        assert!(!confirm(&mut out, &mut other, "Proceed?").unwrap());
    }

    #[test]
    fn block_on_runs_future() {
        assert_eq!(block_on(async { 40 + 2 }).unwrap(), 42);
    }
}
