//! Template rendering.

use crate::server_config::domain::{DEFAULT_COMMAND, ServerLaunchConfig};
use minijinja::{Environment, context};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors returned while rendering a template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// A value failed to render.
    #[error("failed to render template '{template}': {reason}")]
    Render {
        /// Template display name.
        template: String,
        /// Renderer diagnostic.
        reason: String,
    },
}

/// Blueprint for one server entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTemplate {
    name: String,
    server_name: String,
    command: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    auto_start: bool,
}

impl ServerTemplate {
    /// Creates a template launching [`DEFAULT_COMMAND`] with no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, server_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server_name: server_name.into(),
            command: DEFAULT_COMMAND.to_owned(),
            args: Vec::new(),
            env: BTreeMap::new(),
            auto_start: false,
        }
    }

    /// Replaces the command.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
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

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the `mcpServers` key the template deploys to.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Returns the command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the unrendered arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns whether deployed entries start automatically.
    #[must_use]
    pub const fn auto_start(&self) -> bool {
        self.auto_start
    }

    /// Renders the entry for `port`.
    ///
    /// A zero port leaves any `--port` value as written in the template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Render`] when an argument or environment
    /// value is not a valid template.
    pub fn render_config(&self, port: u16) -> Result<ServerLaunchConfig, TemplateError> {
        let environment = Environment::new();
        let render = |source: &str| {
            environment
                .render_str(source, context! { port, server_name => &self.server_name })
                .map_err(|error| TemplateError::Render {
                    template: self.name.clone(),
                    reason: error.to_string(),
                })
        };

        let args = self
            .args
            .iter()
            .map(|arg| render(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let mut config = ServerLaunchConfig::new(self.command.clone())
            .with_args(args)
            .with_auto_start(self.auto_start);
        for (key, value) in &self.env {
            config = config.with_env(key.clone(), render(value)?);
        }

        if port > 0 {
            config.replace_port_value(port);
        }
        Ok(config)
    }
}
