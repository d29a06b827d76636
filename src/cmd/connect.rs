/*!
`connect.rs`

Implements `lightning connect <app_name_or_id|localhost>`.

Resolution order:
  1. This shell already has a marker:
       same app      -> print the connected line, nothing else
       other app     -> disconnect, then continue
  2. Another live shell is connected to the same cloud app and has its commands
     installed -> copy them ("Found existing connection, reusing cached commands")
  3. localhost -> read the local app's OpenAPI document, copy client scripts
     from their `cls_path`
  4. cloud     -> find the app in the project, read its OpenAPI document,
     download client scripts from the app artifacts (after confirmation
     unless --yes)

Installed layout: see `connection` module.
*/

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::app::{
    AppError, AppTarget, Artifact, CloudApp, CommandManifest, HttpPlatform, LOCALHOST,
    parse_target,
};
use crate::cmd::disconnect::disconnect;
use crate::cmd::format::{app_help, pretty_command_name};
use crate::cmd::shared::{LOCAL_CONNECTED, Session, block_on, confirm};
use crate::config::Settings;
use crate::connection::{ConnectionStore, command_file_stem};

/// CLI arguments for `lightning connect`
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// App name or id, or `localhost` for the app running on this machine
    #[arg(value_name = "APP_NAME_OR_ID")]
    pub app_name_or_id: String,

    /// Install the app's commands without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Entry point for the connect subcommand.
pub fn execute_connect(args: ConnectArgs, settings: &Settings) -> Result<()> {
    let store = ConnectionStore::new(&settings.connection_root, &settings.ppid);
    let platform = HttpPlatform::new(settings)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let mut session = Session {
        store: &store,
        platform: &platform,
        out: &mut out,
        input: &mut input,
    };
    block_on(connect(&args.app_name_or_id, args.yes, &mut session))?
}

/// Attach this shell to `app_name_or_id`.
pub async fn connect(app_name_or_id: &str, yes: bool, session: &mut Session<'_>) -> Result<()> {
    let target = parse_target(app_name_or_id)?;
    let store = session.store;

    store.clean_stale()?;
    store.ensure_folder()?;

    if let Some(current) = store.current()? {
        if current.matches(target.name()) {
            if current.is_local() {
                writeln!(session.out, "{LOCAL_CONNECTED}")?;
            } else {
                writeln!(
                    session.out,
                    "You are already connected to the cloud Lightning App: {}.",
                    current.name
                )?;
            }
            return Ok(());
        }
        info!(from = %current.name, to = %target, "switching app connection");
        disconnect(store, session.out)?;
    }

    // Local apps are always queried: another shell's cache may be stale.
    if let AppTarget::Cloud(name) = &target {
        if let Some(cached) = store.find_cached(name)? {
            return reuse_cached(&cached, session);
        }
    }

    // No marker here, so anything under commands/ is from an install that never finished.
    store.discard_commands()?;

    match target {
        AppTarget::Local => connect_local(session).await,
        AppTarget::Cloud(name) => connect_cloud(&name, yes, session).await,
    }
}

fn reuse_cached(cached: &Path, session: &mut Session<'_>) -> Result<()> {
    let store = session.store;
    let scripts = store.adopt(cached)?;

    writeln!(session.out, "Found existing connection, reusing cached commands")?;
    let commands = store.commands_folder();
    for script in &scripts {
        let stem = script.trim_end_matches(".py");
        writeln!(
            session.out,
            "Storing `{}` at {}",
            pretty_command_name(stem),
            commands.join(script).display()
        )?;
    }

    if let Some(c) = store.current()? {
        writeln!(session.out, "You are connected to the cloud Lightning App: {}.", c.name)?;
    }
    Ok(())
}

async fn connect_local(session: &mut Session<'_>) -> Result<()> {
    let store = session.store;

    let manifest = match session.platform.local_openapi().await? {
        Some(doc) => CommandManifest::from_openapi(&doc)?,
        None => CommandManifest::default(),
    };
    if manifest.is_empty() {
        return Err(AppError::CommandsNotFound(LOCALHOST.to_string()).into());
    }
    debug!(commands = manifest.len(), "local app manifest loaded");

    if let Err(err) = install_local_commands(&manifest, session) {
        return Err(rollback(store, err));
    }

    store.record(LOCALHOST, None)?;
    writeln!(session.out, "{LOCAL_CONNECTED}")?;
    Ok(())
}

fn install_local_commands(manifest: &CommandManifest, session: &mut Session<'_>) -> Result<()> {
    let store = session.store;
    let commands = store.ensure_commands_folder()?;
    store.write_metadata(manifest)?;

    for (name, meta) in manifest.iter() {
        let Some(cls_path) = &meta.cls_path else {
            store.write_proxy_marker(name)?;
            continue;
        };
        let target = store.resolve_command_path(name);
        fs::copy(cls_path, &target)
            .with_context(|| format!("Failed to copy the `{name}` client from {cls_path}"))?;
        writeln!(
            session.out,
            "Storing `{}` at {}",
            pretty_command_name(name),
            target.display()
        )?;
    }
    writeln!(
        session.out,
        "You can review all the downloaded commands at {}",
        commands.display()
    )?;
    Ok(())
}

/// Drop a partially installed commands folder, keeping `err` as the outcome.
fn rollback(store: &ConnectionStore, err: anyhow::Error) -> anyhow::Error {
    if let Err(cleanup) = store.discard_commands() {
        warn!(error = %cleanup, "failed to remove partially installed commands");
    }
    err
}

/// `['a', 'b']`
fn quoted_list(names: &[&str]) -> String {
    let items: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
    format!("[{}]", items.join(", "))
}

async fn connect_cloud(name_or_id: &str, yes: bool, session: &mut Session<'_>) -> Result<()> {
    let store = session.store;
    let platform = session.platform;

    let project_id = platform.project_id().await?;
    let apps = platform.list_apps(&project_id).await?;

    let Some(app) = apps.iter().find(|a| a.matches(name_or_id)) else {
        let names: Vec<&str> = apps.iter().map(CloudApp::display_name).collect();
        writeln!(
            session.out,
            "We didn't find a matching App. Here are the available Apps that could be connected to {}.",
            quoted_list(&names)
        )?;
        return Ok(());
    };
    if app.url().is_empty() {
        return Err(AppError::AppStarting.into());
    }

    let doc = platform.app_openapi(app.url()).await?;
    let manifest = CommandManifest::from_openapi(&doc)?;
    if manifest.is_empty() {
        return Err(AppError::CommandsNotFound(app.display_name().to_string()).into());
    }
    debug!(app = %app.id, commands = manifest.len(), "cloud app manifest loaded");

    let install = if yes {
        true
    } else {
        let question = format!(
            "The Lightning App `{name_or_id}` provides a command-line (CLI). \
             Do you want to proceed and install its CLI ?"
        );
        let answer = confirm(session.out, session.input, &question)?;
        writeln!(session.out, " ")?;
        answer
    };

    if install {
        if let Err(err) = install_cloud_commands(&project_id, app, &manifest, session).await {
            return Err(rollback(store, err));
        }
    }

    store.record(app.display_name(), Some(&app.id))?;
    writeln!(session.out, " ")?;
    writeln!(
        session.out,
        "You are connected to the cloud Lightning App: {}.",
        app.display_name()
    )?;

    if install {
        for line in app_help(&manifest) {
            writeln!(session.out, "{line}")?;
        }
    }
    Ok(())
}

async fn install_cloud_commands(
    project_id: &str,
    app: &CloudApp,
    manifest: &CommandManifest,
    session: &mut Session<'_>,
) -> Result<()> {
    let store = session.store;
    let commands = store.ensure_commands_folder()?;
    store.write_metadata(manifest)?;

    // Listed lazily: only needed when a client script is not installed yet.
    let mut artifacts: Option<Vec<Artifact>> = None;

    for (name, meta) in manifest.iter() {
        if !meta.has_client() {
            store.write_proxy_marker(name)?;
            continue;
        }

        let target = store.resolve_command_path(name);
        if target.exists() {
            debug!(command = name, "client already installed");
        } else {
            if artifacts.is_none() {
                artifacts = Some(session.platform.list_artifacts(project_id, &app.id).await?);
            }
            let wanted = format!("commands/{}.py", command_file_stem(name));
            let found = artifacts
                .as_deref()
                .unwrap_or_default()
                .iter()
                .find(|a| a.filename == wanted);

            let Some(artifact) = found else {
                warn!(command = name, artifact = %wanted, "client script not published by the app");
                continue;
            };
            let body = session.platform.download(&artifact.url).await?;
            fs::write(&target, body)
                .with_context(|| format!("Failed to write {}", target.display()))?;
        }

        writeln!(
            session.out,
            "Storing `{}` at {}",
            pretty_command_name(name),
            target.display()
        )?;
    }

    writeln!(
        session.out,
        "You can review all the downloaded commands at {}",
        commands.display()
    )?;
    writeln!(session.out, " ")?;
    writeln!(session.out, "The client interface has been successfully installed. ")?;
    writeln!(session.out, "You can now run the following commands:")?;
    for name in manifest.names() {
        writeln!(session.out, "    lightning {}", pretty_command_name(name))?;
    }
    Ok(())
}
