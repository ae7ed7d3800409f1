//! Application constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

use std::time::Duration;

/// Scroll pipeline configuration
pub mod scroll {
    use super::*;

    /// Same-direction scroll deltas arriving within this window are merged
    pub const COALESCE_WINDOW: Duration = Duration::from_millis(200);

    /// Coalesced scrolls with `|amount| <= SCROLL_TOLERANCE` are not logged
    pub const SCROLL_TOLERANCE: i32 = 10;

    /// Delta reported for programmatic scrolls whose magnitude is unknown
    pub const UNKNOWN_SCROLL_DELTA: i32 = i32::MIN;

    /// Raw scroll state values reported by the list host
    pub const RAW_STATE_IDLE: i32 = 0;
    pub const RAW_STATE_DRAGGING: i32 = 1;
    pub const RAW_STATE_SETTLING: i32 = 2;
}

/// Storage configuration
pub mod storage {
    /// Config directory name
    pub const CONFIG_DIR_NAME: &str = ".feedstream";

    /// Database file name inside the config directory
    pub const DATABASE_FILE_NAME: &str = "feedstream.db";

    /// Config file name inside the config directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}
