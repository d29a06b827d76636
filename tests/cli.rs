use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// The binary, isolated from the user's home: connection folders go to `root`
/// and the session is keyed on this (live) test process.
fn lightning(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lightning").unwrap();
    cmd.env("LIGHTNING_CONNECTION_DIR", root)
        .env("LIGHTNING_CONNECTION_PPID", std::process::id().to_string())
        .env("LIGHTNING_API_KEY", "test-key")
        .env_remove("RUST_LOG")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy");
    cmd
}

/// Local URL with nothing listening behind it.
fn unused_local_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    lightning(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("connect"))
        .stdout(predicate::str::contains("disconnect"))
        .stdout(predicate::str::contains("commands"));
}

#[test]
fn disconnect_without_connection() {
    let dir = TempDir::new().unwrap();
    lightning(dir.path())
        .arg("disconnect")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "You aren't connected to any Lightning App.",
        ));
}

#[test]
fn commands_without_connection() {
    let dir = TempDir::new().unwrap();
    lightning(dir.path())
        .arg("commands")
        .assert()
        .success()
        .stdout(predicate::str::contains("lightning connect app_name_or_id"));
}

#[test]
fn connect_localhost_without_app_fails() {
    let dir = TempDir::new().unwrap();
    lightning(dir.path())
        .args(["connect", "localhost"])
        .env("LIGHTNING_LOCAL_APP_URL", unused_local_url())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "The commands weren't found. Is your app localhost running ?",
        ));
}

#[test]
fn connect_removes_folders_of_dead_shells() {
    let dir = TempDir::new().unwrap();
    let stale = dir.path().join("4000000000");
    fs::create_dir_all(stale.join("commands")).unwrap();
    fs::write(stale.join("connect.txt"), "localhost\n").unwrap();

    lightning(dir.path())
        .args(["connect", "localhost"])
        .env("LIGHTNING_LOCAL_APP_URL", unused_local_url())
        .assert()
        .failure();

    assert!(!stale.exists());
}

#[test]
fn connect_rejects_localhost_with_port() {
    let dir = TempDir::new().unwrap();
    lightning(dir.path())
        .args(["connect", "localhost:7501"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "You need to pass localhost to connect to the local Lightning App.",
        ));
}

#[test]
fn local_app_round_trip() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("connections");
    let client = dir.path().join("client_src.py");
    fs::write(&client, "class CustomCommand: pass\n").unwrap();

    let openapi = serde_json::json!({
        "paths": {
            "/command/command_with_client": {
                "post": {
                    "tags": ["app_client_command"],
                    "description": "A command with a client.",
                    "cls_path": client.to_str().unwrap(),
                    "cls_name": "CustomCommand"
                }
            },
            "/command/nested_command": {
                "post": {"tags": ["app_command"], "description": "A nested command."}
            }
        }
    });

    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/openapi.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(openapi.to_string())
        .create();

    lightning(&root)
        .args(["connect", "localhost"])
        .env("LIGHTNING_LOCAL_APP_URL", server.url())
        .assert()
        .success()
        .stdout(predicate::str::contains("Storing `command with client` at"))
        .stdout(predicate::str::contains(
            "You are connected to the local Lightning App.",
        ));
    mock.assert();

    let folder = root.join(std::process::id().to_string());
    assert_eq!(
        fs::read_to_string(folder.join("connect.txt")).unwrap(),
        "localhost\n"
    );
    assert!(folder.join("commands").join("command_with_client.py").exists());

    lightning(&root)
        .arg("commands")
        .assert()
        .success()
        .stdout(predicate::str::contains("command with client"))
        .stdout(predicate::str::contains("nested command"));

    lightning(&root)
        .arg("disconnect")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "You are disconnected from the local Lightning App.",
        ));
    assert!(!folder.join("connect.txt").exists());
}
