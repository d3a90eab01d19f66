//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! debounce_ms = 300   # Quiet period before queued events are handled
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSectionConfig {
    pub debounce_ms: u64,
}

impl Default for WatchSectionConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}
