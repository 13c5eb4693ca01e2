//! Edit workflow configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1_000;

/// Tunables for an edit session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Save triggers arriving within this many milliseconds of the previously
    /// accepted trigger are ignored.
    pub save_debounce_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
        }
    }
}

impl EditorConfig {
    pub const fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}
