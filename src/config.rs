//! Runtime configuration types.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::vm::DEFAULT_STACK_CAPACITY;

/// Output format for post-run execution statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimingsFormat {
    #[default]
    Human,
    Json,
}

/// Runtime configuration for the VM
///
/// Every field has a default, so a configuration file only needs to name
/// the settings it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Initial operand stack capacity, in items
    pub stack_capacity: usize,
    /// Whether to log each executed instruction to stderr
    pub trace: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            trace: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.stack_capacity, DEFAULT_STACK_CAPACITY);
        assert!(!config.trace);
    }

    #[test]
    fn test_parse_full_file() {
        let config: RuntimeConfig = toml::from_str("stack_capacity = 16\ntrace = true").unwrap();
        assert_eq!(config.stack_capacity, 16);
        assert!(config.trace);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: RuntimeConfig = toml::from_str("trace = true").unwrap();
        assert_eq!(config.stack_capacity, DEFAULT_STACK_CAPACITY);
        assert!(config.trace);
    }
}
