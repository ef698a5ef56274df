//! Static tool offset table.

/// Offset used for any tool without a reserved slot.
pub const DEFAULT_TOOL_OFFSET: u16 = 90;

/// Tools with a reserved slot inside every instance's port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownTool {
    /// `filesystem` server.
    Filesystem,
    /// `sequential-thinking` server.
    SequentialThinking,
    /// `memory` server.
    Memory,
    /// `desktop-commander` server.
    DesktopCommander,
    /// `repl` server.
    Repl,
    /// Playwright browser automation server.
    Playwright,
}

impl KnownTool {
    /// Every known tool in offset order.
    pub const ALL: [Self; 6] = [
        Self::Filesystem,
        Self::SequentialThinking,
        Self::Memory,
        Self::DesktopCommander,
        Self::Repl,
        Self::Playwright,
    ];

    /// Returns the tool identifier as used for server names.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::SequentialThinking => "sequential-thinking",
            Self::Memory => "memory",
            Self::DesktopCommander => "desktop-commander",
            Self::Repl => "repl",
            Self::Playwright => "@executeautomation-playwright-mcp-server",
        }
    }

    /// Returns the tool's offset from the instance base port.
    #[must_use]
    pub const fn offset(self) -> u16 {
        match self {
            Self::Filesystem => 10,
            Self::SequentialThinking => 20,
            Self::Memory => 30,
            Self::DesktopCommander => 40,
            Self::Repl => 50,
            Self::Playwright => 60,
        }
    }

    /// Looks up a tool by exact identifier.
    #[must_use]
    pub fn from_id(tool_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.id() == tool_id)
    }
}

/// Returns the offset for `tool_id`, or [`DEFAULT_TOOL_OFFSET`] when the
/// tool has no reserved slot.
#[must_use]
pub fn tool_port_offset(tool_id: &str) -> u16 {
    KnownTool::from_id(tool_id).map_or(DEFAULT_TOOL_OFFSET, KnownTool::offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("filesystem", 10)]
    #[case("sequential-thinking", 20)]
    #[case("memory", 30)]
    #[case("desktop-commander", 40)]
    #[case("repl", 50)]
    #[case("@executeautomation-playwright-mcp-server", 60)]
    #[case("weather", 90)]
    #[case("Filesystem", 90)]
    fn offsets_match_table(#[case] tool_id: &str, #[case] expected: u16) {
        assert_eq!(tool_port_offset(tool_id), expected);
    }

    #[test]
    fn ids_round_trip() {
        for tool in KnownTool::ALL {
            assert_eq!(KnownTool::from_id(tool.id()), Some(tool));
        }
    }
}
