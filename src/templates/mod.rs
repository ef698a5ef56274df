//! Reusable server configuration blueprints.
//!
//! A template renders into a [`ServerLaunchConfig`] for a concrete port.
//! Argument and environment values may use `minijinja` expressions over
//! `port` and `server_name`; a `--port` argument is also rewritten directly
//! when a port is supplied.
//!
//! [`ServerLaunchConfig`]: crate::server_config::domain::ServerLaunchConfig

mod catalog;
mod template;

pub use catalog::{builtin_templates, find_by_name, find_by_server_name};
pub use template::{ServerTemplate, TemplateError};
