//! Command manifest extracted from an app's OpenAPI document.
//!
//! Every path under `/command/` is a remotely invocable command; its `post`
//! operation carries the metadata (tag, parameters, optional client class).
//! Path order is kept so listings follow the order the app declares.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const COMMAND_PREFIX: &str = "/command/";

/// App-level information attached to the commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    #[serde(default)]
    pub tag: Option<String>,
    /// Parameter name -> declared schema type
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
    /// Location of the client script (a local path for local apps)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cls_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cls_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_info: Option<AppInfo>,
}

impl CommandMetadata {
    /// Whether the command ships a client script to install.
    pub fn has_client(&self) -> bool {
        self.cls_path.is_some()
    }

    fn from_operation(op: &Value) -> Self {
        let str_field = |key: &str| op.get(key).and_then(Value::as_str).map(str::to_string);

        let tag = op
            .get("tags")
            .and_then(Value::as_array)
            .and_then(|tags| tags.first())
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut parameters = IndexMap::new();
        if let Some(params) = op.get("parameters").and_then(Value::as_array) {
            for p in params {
                let Some(name) = p.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let ty = p
                    .get("schema")
                    .and_then(|s| s.get("type"))
                    .and_then(Value::as_str)
                    .unwrap_or("string");
                parameters.insert(name.to_string(), ty.to_string());
            }
        }

        let requirements = op.get("requirements").and_then(Value::as_array).map(|reqs| {
            reqs.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });

        let app_info = op
            .get("app_info")
            .filter(|v| v.is_object())
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        Self {
            tag,
            parameters,
            cls_path: str_field("cls_path"),
            cls_name: str_field("cls_name"),
            description: str_field("description"),
            requirements,
            app_info,
        }
    }
}

/// Ordered command name -> metadata mapping. Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandManifest(IndexMap<String, CommandMetadata>);

impl CommandManifest {
    pub fn from_openapi(doc: &Value) -> Result<Self> {
        let paths = doc
            .get("paths")
            .and_then(Value::as_object)
            .context("OpenAPI document has no `paths` object")?;

        let mut commands = IndexMap::new();
        for (path, item) in paths {
            let Some(name) = path.strip_prefix(COMMAND_PREFIX) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let metadata = item
                .get("post")
                .map(CommandMetadata::from_operation)
                .unwrap_or_default();
            commands.insert(name.to_string(), metadata);
        }
        Ok(Self(commands))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw command names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandMetadata)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// App info carried by the first command (in sorted order) that has one.
    pub fn app_info(&self) -> Option<&AppInfo> {
        let mut names: Vec<&String> = self.0.keys().collect();
        names.sort();
        names
            .into_iter()
            .find_map(|n| self.0.get(n).and_then(|m| m.app_info.as_ref()))
    }
}
