//! Generation tracking for index rebuilds

use serde::{Deserialize, Serialize};

/// Monotonically increasing rebuild counter; 0 means the index was never built
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    /// Create a new generation starting at 0
    pub fn new() -> Self {
        Self(0)
    }

    /// Create a generation from a raw value
    pub fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw u64 value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Whether no rebuild has been installed yet
    pub fn is_initial(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
