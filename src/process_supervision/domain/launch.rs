//! Fully resolved launch request.

use super::ServerKey;
use crate::server_config::domain::ServerLaunchConfig;
use std::collections::BTreeMap;

/// Port handed to the server.
pub const MCP_PORT_ENV: &str = "MCP_PORT";

/// Port handed to the server, alternate name.
pub const MCP_SERVER_PORT_ENV: &str = "MCP_SERVER_PORT";

/// Instance the server belongs to.
pub const CLAUDE_INSTANCE_ENV: &str = "CLAUDE_INSTANCE";

/// Everything needed to spawn one server.
///
/// The environment lists additions only; the child also inherits the
/// supervisor's own environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    key: ServerKey,
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    port: u16,
}

impl LaunchSpec {
    /// Resolves the launch request for `key` from its configuration entry.
    ///
    /// The configured environment is extended with [`MCP_PORT_ENV`] and
    /// [`MCP_SERVER_PORT_ENV`] set to `port` and [`CLAUDE_INSTANCE_ENV`] set to
    /// the instance name. These three always win over configured values.
    #[must_use]
    pub fn resolve(key: ServerKey, config: &ServerLaunchConfig, port: u16) -> Self {
        let mut env = config.env().clone();
        let port_value = port.to_string();
        env.insert(MCP_PORT_ENV.to_owned(), port_value.clone());
        env.insert(MCP_SERVER_PORT_ENV.to_owned(), port_value);
        env.insert(
            CLAUDE_INSTANCE_ENV.to_owned(),
            key.instance().as_str().to_owned(),
        );

        Self {
            program: config.command().to_owned(),
            args: config.args().to_vec(),
            env,
            port,
            key,
        }
    }

    /// Returns the server identity.
    #[must_use]
    pub const fn key(&self) -> &ServerKey {
        &self.key
    }

    /// Returns the executable.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the environment additions.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Returns the port the server was told to use.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the program and arguments joined by spaces.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
