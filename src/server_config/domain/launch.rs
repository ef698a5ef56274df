//! Launch configuration for one helper server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Command used when an entry omits `command`.
pub const DEFAULT_COMMAND: &str = "npx";

/// Argument introducing the server's listening port.
pub const PORT_FLAG: &str = "--port";

/// How an argument list declares its port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortArgument {
    /// No `--port` flag.
    Absent,
    /// `--port` followed by a valid port number.
    Present(u16),
    /// `--port` is the last argument or is followed by something that is not
    /// a port number.
    Invalid,
}

impl PortArgument {
    /// Returns the declared port when it is a usable, non-zero value.
    #[must_use]
    pub const fn declared(self) -> Option<u16> {
        match self {
            Self::Present(port) if port > 0 => Some(port),
            _ => None,
        }
    }
}

/// One `mcpServers` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerLaunchConfig {
    #[serde(default = "default_command")]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(rename = "autoStart", default)]
    auto_start: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn default_command() -> String {
    DEFAULT_COMMAND.to_owned()
}

impl Default for ServerLaunchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND)
    }
}

impl ServerLaunchConfig {
    /// Creates an entry running `command` with no arguments.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            auto_start: false,
            extra: Map::new(),
        }
    }

    /// Replaces the argument list.
    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the auto-start flag.
    #[must_use]
    pub const fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Returns the executable.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the arguments in order.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the configured environment additions.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Returns whether the server starts with its instance.
    #[must_use]
    pub const fn auto_start(&self) -> bool {
        self.auto_start
    }

    /// Inspects the `--port` argument.
    #[must_use]
    pub fn port_argument(&self) -> PortArgument {
        let Some(position) = self.args.iter().position(|arg| arg == PORT_FLAG) else {
            return PortArgument::Absent;
        };
        self.args
            .get(position + 1)
            .and_then(|value| value.parse::<u16>().ok())
            .map_or(PortArgument::Invalid, PortArgument::Present)
    }

    /// Overwrites the value following `--port`, if both exist.
    ///
    /// Returns whether a value was replaced.
    pub fn replace_port_value(&mut self, port: u16) -> bool {
        let Some(position) = self.args.iter().position(|arg| arg == PORT_FLAG) else {
            return false;
        };
        let Some(slot) = self.args.get_mut(position + 1) else {
            return false;
        };
        *slot = port.to_string();
        true
    }

    /// Forces `--port <port>` into the arguments.
    ///
    /// An existing value is replaced, a dangling `--port` gets its value
    /// appended, and a missing flag is appended together with the value.
    pub fn force_port(&mut self, port: u16) {
        if self.replace_port_value(port) {
            return;
        }
        if !self.args.iter().any(|arg| arg == PORT_FLAG) {
            self.args.push(PORT_FLAG.to_owned());
        }
        self.args.push(port.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn with_args(args: &[&str]) -> ServerLaunchConfig {
        ServerLaunchConfig::default().with_args(args.iter().copied())
    }

    #[rstest]
    #[case(&["-y", "pkg"], PortArgument::Absent)]
    #[case(&["-y", "pkg", "--port", "9130"], PortArgument::Present(9130))]
    #[case(&["-y", "pkg", "--port", "0"], PortArgument::Present(0))]
    #[case(&["-y", "pkg", "--port"], PortArgument::Invalid)]
    #[case(&["--port", "abc"], PortArgument::Invalid)]
    #[case(&["--port", "70000"], PortArgument::Invalid)]
    fn port_argument_is_classified(#[case] args: &[&str], #[case] expected: PortArgument) {
        assert_eq!(with_args(args).port_argument(), expected);
    }

    #[rstest]
    #[case(&["pkg", "--port", "0"], &["pkg", "--port", "9110"])]
    #[case(&["pkg", "--port"], &["pkg", "--port", "9110"])]
    #[case(&["pkg"], &["pkg", "--port", "9110"])]
    fn force_port_always_leaves_a_valid_flag(#[case] before: &[&str], #[case] after: &[&str]) {
        let mut config = with_args(before);

        config.force_port(9110);

        assert_eq!(config.args(), after);
    }

    #[test]
    fn replace_port_value_ignores_dangling_flag() {
        let mut config = with_args(&["pkg", "--port"]);

        assert!(!config.replace_port_value(9110));
        assert_eq!(config.args(), ["pkg", "--port"]);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: ServerLaunchConfig =
            serde_json::from_value(json!({})).expect("entry should parse");

        assert_eq!(config.command(), "npx");
        assert!(config.args().is_empty());
        assert!(!config.auto_start());
    }

    #[test]
    fn auto_start_uses_camel_case_key() {
        let config = ServerLaunchConfig::new("node").with_auto_start(true);

        let encoded = serde_json::to_value(&config).expect("entry should encode");

        assert_eq!(
            encoded,
            json!({"command": "node", "args": [], "env": {}, "autoStart": true})
        );
    }
}
