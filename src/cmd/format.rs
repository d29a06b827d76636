/*!
format.rs

Text layout for the human output of `connect` and `commands`.

These helpers return lines instead of printing so the commands decide where
the text goes (stdout in the binary, a buffer in tests).

Public API Summary:
  - pretty_command_name(name) -> String        "nested_command" -> "nested command"
  - aligned_rows(rows, indent) -> Vec<String>  two-column layout padded to the widest name
  - app_help(manifest) -> Vec<String>          usage block listing the app commands
  - command_listing(manifest) -> Vec<String>   title / description / commands block
*/

use crate::app::CommandManifest;

pub fn pretty_command_name(name: &str) -> String {
    name.replace('_', " ")
}

/// Lay out `(name, description)` pairs with the description column starting
/// one space after the longest name.
pub fn aligned_rows(rows: &[(String, String)], indent: &str) -> Vec<String> {
    let width = rows.iter().map(|(n, _)| n.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|(name, desc)| {
            let pad = width + 1 - name.chars().count();
            format!("{indent}{name}{}{desc}", " ".repeat(pad))
        })
        .collect()
}

/// Pretty names with descriptions, sorted by pretty name.
fn sorted_rows(manifest: &CommandManifest) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = manifest
        .iter()
        .map(|(name, meta)| {
            (
                pretty_command_name(name),
                meta.description.clone().unwrap_or_default(),
            )
        })
        .collect();
    rows.sort();
    rows
}

/// Usage block shown once an app's commands are installed.
pub fn app_help(manifest: &CommandManifest) -> Vec<String> {
    let mut lines = vec![
        "Usage: lightning [OPTIONS] COMMAND [ARGS]...".to_string(),
        String::new(),
        "  --help     Show this message and exit.".to_string(),
        String::new(),
        "Lightning App Commands".to_string(),
    ];
    lines.extend(aligned_rows(&sorted_rows(manifest), "  "));
    lines
}

/// Listing printed by `lightning commands`.
pub fn command_listing(manifest: &CommandManifest) -> Vec<String> {
    let info = manifest.app_info();
    let title = info
        .and_then(|i| i.title.as_deref())
        .unwrap_or("Lightning");

    let mut lines = vec![format!("{title} App")];
    if let Some(description) = info.and_then(|i| i.description.as_deref()) {
        lines.push(String::new());
        lines.push("Description:".to_string());
        lines.push(format!("  {}", description.trim_end()));
    }
    lines.push(String::new());
    lines.push("Commands:".to_string());
    lines.extend(aligned_rows(&sorted_rows(manifest), "  "));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest() -> CommandManifest {
        CommandManifest::from_openapi(&json!({
            "paths": {
                "/command/command_without_client": {"post": {"description": "A command without a client."}},
                "/command/command_with_client": {"post": {"description": "A command with a client.", "cls_path": "x.py"}},
                "/command/nested_command": {"post": {"description": "A nested command."}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn pretty_names() {
        assert_eq!(pretty_command_name("command_with_client"), "command with client");
        assert_eq!(pretty_command_name("plain"), "plain");
    }

    #[test]
    fn rows_are_aligned() {
        let rows = vec![
            ("ab".to_string(), "first".to_string()),
            ("abcd".to_string(), "second".to_string()),
        ];
        assert_eq!(aligned_rows(&rows, "  "), vec!["  ab   first", "  abcd second"]);
        assert!(aligned_rows(&[], "  ").is_empty());
    }

    #[test]
    fn help_block_lists_sorted_commands() {
        assert_eq!(
            app_help(&manifest()),
            vec![
                "Usage: lightning [OPTIONS] COMMAND [ARGS]...",
                "",
                "  --help     Show this message and exit.",
                "",
                "Lightning App Commands",
                "  command with client    A command with a client.",
                "  command without client A command without a client.",
                "  nested command         A nested command.",
            ]
        );
    }

    #[test]
    fn listing_defaults_title() {
        let lines = command_listing(&manifest());
        assert_eq!(lines[0], "Lightning App");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Commands:");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn listing_uses_app_info() {
        let m = CommandManifest::from_openapi(&json!({
            "paths": {
                "/command/run": {"post": {
                    "description": "Run it.",
                    "app_info": {"title": "Demo", "description": "Does things.\n"}
                }}
            }
        }))
        .unwrap();
        assert_eq!(
            command_listing(&m),
            vec!["Demo App", "", "Description:", "  Does things.", "", "Commands:", "  run Run it."]
        );
    }
}
