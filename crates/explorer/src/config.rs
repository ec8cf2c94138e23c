//! Explorer tuning.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ExplorerConfig {
    /// Command-log depth that forces a path switch. Guards against
    /// navigation loops on pages that link back into themselves.
    pub max_command_log: usize,
    pub navigation_timeout: Duration,
    pub click_timeout: Duration,
    pub settle_timeout: Duration,
    /// Pause between filling a field and submitting it, giving
    /// type-ahead handlers a chance to fire.
    pub fill_settle: Duration,
    /// Where step screenshots land; `None` disables capture.
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_command_log: 20,
            navigation_timeout: Duration::from_secs(15),
            click_timeout: Duration::from_secs(5),
            settle_timeout: Duration::from_secs(10),
            fill_settle: Duration::from_millis(1000),
            screenshot_dir: None,
        }
    }
}
