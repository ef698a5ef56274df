//! Filesystem locations and their environment overrides.
//!
//! Two roots drive every durable document:
//!
//! - the manager home (`CMGR_HOME`, default `~/.cmgr`) holding the port
//!   registry and the instance registry;
//! - the sandbox base (`SANDBOX_BASE`, default `~/sandboxes`) holding one
//!   sandbox directory per instance, each with its own server configuration
//!   document.

use crate::instance::InstanceName;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Environment variable overriding the manager home directory.
pub const HOME_ENV: &str = "CMGR_HOME";

/// Environment variable overriding the sandbox base directory.
pub const SANDBOX_BASE_ENV: &str = "SANDBOX_BASE";

const DEFAULT_HOME_DIR: &str = ".cmgr";
const DEFAULT_SANDBOX_DIR: &str = "sandboxes";
const PORT_REGISTRY_FILE: &str = "port_registry.json";
const INSTANCE_REGISTRY_FILE: &str = "registry.json";
const INSTANCE_CONFIG_SEGMENTS: [&str; 3] = [".config", "Claude", "claude_desktop_config.json"];

/// Errors returned while resolving manager paths.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No override was given and the user's home directory is unknown.
    #[error("cannot determine the user home directory; set {0}")]
    HomeDirectoryUnavailable(&'static str),

    /// The user's home directory is not valid UTF-8.
    #[error("home directory is not valid UTF-8: {0}")]
    NonUtf8Path(String),
}

/// Resolved locations of the manager's durable documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerPaths {
    home: Utf8PathBuf,
    sandbox_base: Utf8PathBuf,
}

impl ManagerPaths {
    /// Creates paths from explicit roots.
    #[must_use]
    pub fn new(home: impl Into<Utf8PathBuf>, sandbox_base: impl Into<Utf8PathBuf>) -> Self {
        Self {
            home: home.into(),
            sandbox_base: sandbox_base.into(),
        }
    }

    /// Resolves paths from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a default is needed and the user's home
    /// directory cannot be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves paths using `lookup` in place of the process environment.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a default is needed and the user's home
    /// directory cannot be determined.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let home = match non_empty(lookup(HOME_ENV)) {
            Some(value) => Utf8PathBuf::from(value),
            None => user_home(HOME_ENV)?.join(DEFAULT_HOME_DIR),
        };
        let sandbox_base = match non_empty(lookup(SANDBOX_BASE_ENV)) {
            Some(value) => Utf8PathBuf::from(value),
            None => user_home(SANDBOX_BASE_ENV)?.join(DEFAULT_SANDBOX_DIR),
        };
        Ok(Self { home, sandbox_base })
    }

    /// Replaces the manager home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<Utf8PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    /// Replaces the sandbox base directory.
    #[must_use]
    pub fn with_sandbox_base(mut self, sandbox_base: impl Into<Utf8PathBuf>) -> Self {
        self.sandbox_base = sandbox_base.into();
        self
    }

    /// Returns the manager home directory.
    #[must_use]
    pub fn home(&self) -> &Utf8Path {
        &self.home
    }

    /// Returns the sandbox base directory.
    #[must_use]
    pub fn sandbox_base(&self) -> &Utf8Path {
        &self.sandbox_base
    }

    /// Returns the port registry document path.
    #[must_use]
    pub fn port_registry_path(&self) -> Utf8PathBuf {
        self.home.join(PORT_REGISTRY_FILE)
    }

    /// Returns the instance registry document path.
    #[must_use]
    pub fn instance_registry_path(&self) -> Utf8PathBuf {
        self.home.join(INSTANCE_REGISTRY_FILE)
    }

    /// Returns the sandbox directory of an instance.
    #[must_use]
    pub fn sandbox_dir(&self, instance: &InstanceName) -> Utf8PathBuf {
        self.sandbox_base.join(instance.as_str())
    }

    /// Returns the server configuration document path of an instance.
    #[must_use]
    pub fn instance_config_path(&self, instance: &InstanceName) -> Utf8PathBuf {
        INSTANCE_CONFIG_SEGMENTS
            .iter()
            .fold(self.sandbox_dir(instance), |path, segment| path.join(segment))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|candidate| !candidate.trim().is_empty())
}

fn user_home(override_variable: &'static str) -> Result<Utf8PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeDirectoryUnavailable(override_variable))?;
    Utf8PathBuf::from_path_buf(home)
        .map_err(|path| ConfigError::NonUtf8Path(path.display().to_string()))
}
