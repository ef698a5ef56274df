//! Built-in template catalogue.

use super::ServerTemplate;

const HOME_DIRECTORY: &str = "/home/claude";

const BUILTINS: [(&str, &str, &str, bool); 6] = [
    (
        "Filesystem",
        "filesystem",
        "@modelcontextprotocol/filesystem",
        true,
    ),
    (
        "Sequential Thinking",
        "sequential-thinking",
        "@modelcontextprotocol/sequential-thinking",
        true,
    ),
    ("Memory", "memory", "@modelcontextprotocol/memory", false),
    (
        "Desktop Commander",
        "desktop-commander",
        "@modelcontextprotocol/desktop-commander",
        true,
    ),
    ("REPL", "repl", "@modelcontextprotocol/repl", false),
    (
        "Playwright",
        "@executeautomation-playwright-mcp-server",
        "@executeautomation/playwright-mcp-server",
        false,
    ),
];

/// Returns the built-in templates, one per well-known tool.
#[must_use]
pub fn builtin_templates() -> Vec<ServerTemplate> {
    BUILTINS
        .iter()
        .map(|&(name, server_name, package, auto_start)| {
            ServerTemplate::new(name, server_name)
                .with_args(["-y", package, "--port", "0"])
                .with_env("HOME", HOME_DIRECTORY)
                .with_auto_start(auto_start)
        })
        .collect()
}

/// Finds a built-in template by display name.
#[must_use]
pub fn find_by_name(name: &str) -> Option<ServerTemplate> {
    builtin_templates()
        .into_iter()
        .find(|template| template.name() == name)
}

/// Finds a built-in template by the server name it deploys to.
#[must_use]
pub fn find_by_server_name(server_name: &str) -> Option<ServerTemplate> {
    builtin_templates()
        .into_iter()
        .find(|template| template.server_name() == server_name)
}
