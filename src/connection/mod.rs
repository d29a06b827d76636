//! Per-process-tree connection state.
//!
//! Layout under the connection root:
//!   <ppid>/connect.txt            app name, then the cloud app id (one per line)
//!   <ppid>/commands/<cmd>.py      installed client scripts
//!   <ppid>/commands/<cmd>.txt     proxy markers for commands without a client
//!   <ppid>/commands/.meta.json    command manifest
//!
//! The ppid is the id of the shell that launched the CLI, so every terminal
//! keeps its own connection. Folders of dead shells are garbage collected.

pub mod process;

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::app::{CommandManifest, LOCALHOST};

pub const CONNECTED_FILE: &str = "connect.txt";
pub const COMMANDS_DIR: &str = "commands";
pub const METADATA_FILE: &str = ".meta.json";

/// The app a session is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub name: String,
    pub id: Option<String>,
}

impl Connection {
    pub fn is_local(&self) -> bool {
        self.name == LOCALHOST
    }

    /// Whether this connection points at `app` (by name or id).
    pub fn matches(&self, app: &str) -> bool {
        self.name == app || self.id.as_deref() == Some(app)
    }
}

/// File name used for a command's client script or proxy marker.
pub fn command_file_stem(command: &str) -> String {
    command.replace(' ', "_")
}

#[derive(Debug, Clone)]
pub struct ConnectionStore {
    root: PathBuf,
    ppid: String,
    folder: PathBuf,
    is_alive: fn(u32) -> bool,
}

impl ConnectionStore {
    pub fn new(root: impl Into<PathBuf>, ppid: impl Into<String>) -> Self {
        let root = root.into();
        let ppid = ppid.into();
        let folder = root.join(&ppid);
        Self {
            root,
            ppid,
            folder,
            is_alive: process::is_alive,
        }
    }

    /// Replace the liveness check used to spot folders of dead shells.
    pub fn with_liveness(mut self, is_alive: fn(u32) -> bool) -> Self {
        self.is_alive = is_alive;
        self
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn connected_file(&self) -> PathBuf {
        self.folder().join(CONNECTED_FILE)
    }

    pub fn commands_folder(&self) -> PathBuf {
        self.folder().join(COMMANDS_DIR)
    }

    /// Where the client script of `command` is installed.
    pub fn resolve_command_path(&self, command: &str) -> PathBuf {
        self.commands_folder()
            .join(format!("{}.py", command_file_stem(command)))
    }

    pub fn ensure_folder(&self) -> Result<()> {
        fs::create_dir_all(&self.folder)
            .with_context(|| format!("Failed to create {}", self.folder.display()))
    }

    pub fn ensure_commands_folder(&self) -> Result<PathBuf> {
        let dir = self.commands_folder();
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(dir)
    }

    /// Connection recorded for this session, if any.
    pub fn current(&self) -> Result<Option<Connection>> {
        read_connection(&self.connected_file())
    }

    pub fn record(&self, name: &str, id: Option<&str>) -> Result<()> {
        self.ensure_folder()?;
        let mut content = format!("{name}\n");
        if let Some(id) = id {
            content.push_str(id);
            content.push('\n');
        }
        let path = self.connected_file();
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Drop the marker and installed commands, returning what was connected.
    pub fn clear(&self) -> Result<Option<Connection>> {
        let previous = self.current()?;
        if previous.is_none() {
            return Ok(None);
        }

        let marker = self.connected_file();
        fs::remove_file(&marker).with_context(|| format!("Failed to remove {}", marker.display()))?;

        self.discard_commands()?;
        Ok(previous)
    }

    /// Remove installed commands whether or not a marker exists.
    pub fn discard_commands(&self) -> Result<()> {
        remove_dir_if_present(&self.commands_folder())?;
        Ok(())
    }

    /// Remove folders whose ppid no longer names a live process.
    /// The folder of this session is always kept.
    pub fn clean_stale(&self) -> Result<usize> {
        let mut removed = 0;
        for (ppid, path) in self.other_folders()? {
            if self.ppid_alive(&ppid) {
                continue;
            }
            debug!(%ppid, path = %path.display(), "removing stale connection");
            // Another shell may be collecting the same folder.
            if remove_dir_if_present(&path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Folder of another live session already connected to `app` with
    /// installed commands.
    pub fn find_cached(&self, app: &str) -> Result<Option<PathBuf>> {
        for (ppid, path) in self.other_folders()? {
            if !self.ppid_alive(&ppid) {
                continue;
            }
            let Some(connection) = read_connection(&path.join(CONNECTED_FILE))? else {
                continue;
            };
            if connection.matches(app) && path.join(COMMANDS_DIR).is_dir() {
                debug!(%ppid, app, "found cached connection");
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// Copy another session's commands and marker into this one. Returns the
    /// copied client script file names, sorted.
    pub fn adopt(&self, other: &Path) -> Result<Vec<String>> {
        let source = other.join(COMMANDS_DIR);
        let target = self.ensure_commands_folder()?;

        let mut scripts = Vec::new();
        let entries = fs::read_dir(&source)
            .with_context(|| format!("Failed to read {}", source.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            fs::copy(entry.path(), target.join(&name)).with_context(|| {
                format!("Failed to copy {}", entry.path().display())
            })?;

            let name = name.to_string_lossy().into_owned();
            if name.ends_with(".py") {
                scripts.push(name);
            }
        }
        scripts.sort();

        let marker = self.connected_file();
        fs::copy(other.join(CONNECTED_FILE), &marker)
            .with_context(|| format!("Failed to write {}", marker.display()))?;
        Ok(scripts)
    }

    pub fn write_metadata(&self, manifest: &CommandManifest) -> Result<()> {
        let path = self.ensure_commands_folder()?.join(METADATA_FILE);
        let content = serde_json::to_string(manifest)?;
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn read_metadata(&self) -> Result<Option<CommandManifest>> {
        let path = self.commands_folder().join(METADATA_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let manifest = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(manifest))
    }

    /// Proxy marker for a command that has no client script.
    pub fn write_proxy_marker(&self, command: &str) -> Result<PathBuf> {
        let path = self
            .ensure_commands_folder()?
            .join(format!("{}.txt", command_file_stem(command)));
        fs::write(&path, command).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    fn ppid_alive(&self, ppid: &str) -> bool {
        ppid.parse::<u32>().map(self.is_alive).unwrap_or(false)
    }

    /// Connection folders of every session but this one.
    fn other_folders(&self) -> Result<Vec<(String, PathBuf)>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut folders = Vec::new();
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == self.ppid {
                continue;
            }
            folders.push((name, entry.path()));
        }
        folders.sort();
        Ok(folders)
    }
}

/// `remove_dir_all` that treats an already missing directory as done.
/// Returns whether anything was removed.
fn remove_dir_if_present(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

fn read_connection(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
    let Some(name) = lines.next() else {
        return Ok(None);
    };
    Ok(Some(Connection {
        name: name.to_string(),
        id: lines.next().map(str::to_string),
    }))
}
