//! Instance desktop configuration document.

use super::ServerLaunchConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Preload script referenced by freshly created documents.
pub const BASELINE_PRELOAD_SCRIPT: &str = "/home/claude/.config/Claude/electron/preload.js";

/// An instance's desktop configuration.
///
/// Only `mcpServers` is interpreted; every other top-level key is kept as
/// is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfigDocument {
    #[serde(rename = "mcpServers", default)]
    servers: BTreeMap<String, ServerLaunchConfig>,
    #[serde(flatten)]
    passthrough: Map<String, Value>,
}

impl ServerConfigDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the document written for an instance that has none yet.
    #[must_use]
    pub fn with_baseline_defaults() -> Self {
        let mut passthrough = Map::new();
        passthrough.insert("showTray".to_owned(), Value::Bool(true));
        passthrough.insert(
            "electronInitScript".to_owned(),
            Value::String(BASELINE_PRELOAD_SCRIPT.to_owned()),
        );
        Self {
            servers: BTreeMap::new(),
            passthrough,
        }
    }

    /// Returns the entry for `name`.
    #[must_use]
    pub fn server(&self, name: &str) -> Option<&ServerLaunchConfig> {
        self.servers.get(name)
    }

    /// Iterates entries ordered by server name.
    pub fn servers(&self) -> impl Iterator<Item = (&str, &ServerLaunchConfig)> {
        self.servers
            .iter()
            .map(|(name, config)| (name.as_str(), config))
    }

    /// Inserts or replaces the entry for `name`, returning the previous one.
    pub fn upsert_server(
        &mut self,
        name: impl Into<String>,
        config: ServerLaunchConfig,
    ) -> Option<ServerLaunchConfig> {
        self.servers.insert(name.into(), config)
    }

    /// Returns the names of servers flagged to start with the instance.
    #[must_use]
    pub fn auto_start_servers(&self) -> Vec<String> {
        self.servers
            .iter()
            .filter(|(_, config)| config.auto_start())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Returns a top-level key that is not `mcpServers`.
    #[must_use]
    pub fn passthrough(&self, key: &str) -> Option<&Value> {
        self.passthrough.get(key)
    }
}
