//! Process lookups backing the per-process-tree connection key.

use anyhow::{Context, Result, anyhow};
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Id of the process that launched this CLI (usually the user's shell).
pub fn parent_pid() -> Result<u32> {
    let pid = sysinfo::get_current_pid()
        .map_err(|e| anyhow!("Unable to determine current process id: {e}"))?;

    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    let parent = system
        .process(pid)
        .and_then(|p| p.parent())
        .context("Unable to determine parent process id")?;
    Ok(parent.as_u32())
}

/// Whether `pid` currently names a running process.
pub fn is_alive(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some()
}
