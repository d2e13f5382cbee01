//! Shell Commands Module
//!
//! Contains all command implementations organized by category.

pub mod builtin;
pub mod copy;
pub mod dir;
pub mod fs;

use super::Command;

// Re-export static command instances
pub use builtin::{
    CD_CMD, CLS_CMD, COLOR_CMD, ECHO_CMD, EXIT_CMD, HELP_CMD, POWEROFF_CMD, REBOOT_CMD, VER_CMD,
};
pub use copy::COPY_CMD;
pub use dir::DIR_CMD;
pub use fs::{DEL_CMD, MD_CMD, RD_CMD, REN_CMD, TYPE_CMD};

// ============================================================================
// Argument Helpers
// ============================================================================

/// Split off the first whitespace-delimited word; the rest is trimmed
pub fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find([' ', '\t']) {
        Some(idx) => (&s[..idx], s[idx..].trim()),
        None => (s, ""),
    }
}

// ============================================================================
// Command Registry
// ============================================================================

/// Maximum number of commands that can be registered
const MAX_COMMANDS: usize = 32;

/// Registry of available commands
pub struct CommandRegistry {
    commands: Vec<&'static dyn Command>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a command
    pub fn register(&mut self, command: &'static dyn Command) {
        if self.commands.len() < MAX_COMMANDS {
            self.commands.push(command);
        } else {
            log::warn!("command table full, dropping {}", command.name());
        }
    }

    /// Find a command by name or alias, ignoring case
    pub fn find(&self, name: &str) -> Option<&'static dyn Command> {
        if name.is_empty() {
            return None;
        }
        self.commands.iter().copied().find(|cmd| {
            cmd.name().eq_ignore_ascii_case(name)
                || cmd.aliases().iter().any(|alias| alias.eq_ignore_ascii_case(name))
        })
    }

    /// Get all registered commands
    pub fn commands(&self) -> &[&'static dyn Command] {
        &self.commands
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create and populate the default command registry
pub fn create_default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    // Built-in commands
    registry.register(&HELP_CMD);
    registry.register(&VER_CMD);
    registry.register(&CLS_CMD);
    registry.register(&ECHO_CMD);
    registry.register(&CD_CMD);
    registry.register(&COLOR_CMD);

    // File commands
    registry.register(&DIR_CMD);
    registry.register(&TYPE_CMD);
    registry.register(&COPY_CMD);
    registry.register(&DEL_CMD);
    registry.register(&REN_CMD);
    registry.register(&MD_CMD);
    registry.register(&RD_CMD);

    // Session and power
    registry.register(&EXIT_CMD);
    registry.register(&POWEROFF_CMD);
    registry.register(&REBOOT_CMD);

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_ignores_case_and_aliases() {
        let registry = create_default_registry();
        assert_eq!(registry.find("dir").map(|c| c.name()), Some("DIR"));
        assert_eq!(registry.find("Erase").map(|c| c.name()), Some("DEL"));
        assert_eq!(registry.find("chdir").map(|c| c.name()), Some("CD"));
        assert!(registry.find("").is_none());
        assert!(registry.find("ls").is_none());
    }

    #[test]
    fn test_split_first_word() {
        assert_eq!(split_first_word("a.txt  b.txt "), ("a.txt", "b.txt"));
        assert_eq!(split_first_word("  only"), ("only", ""));
        assert_eq!(split_first_word(""), ("", ""));
    }
}
