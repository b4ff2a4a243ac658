use std::time::Duration;

use crate::config::OffloadSettings;

/// What the manager does when a task runs long.
///
/// Tasks are never cancelled; a refresh on a slow network still lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Stay silent.
    #[default]
    None,
    /// Log a warning once the task finishes if it took longer than this.
    Warn(Duration),
}

/// Settings of an [`OffloadManager`](super::OffloadManager).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffloadConfig {
    /// Slow task handling.
    pub timeout_policy: TimeoutPolicy,
}

impl OffloadConfig {
    /// Warns about tasks running longer than `threshold`.
    pub fn warn_after(threshold: Duration) -> Self {
        Self {
            timeout_policy: TimeoutPolicy::Warn(threshold),
        }
    }
}

impl From<&OffloadSettings> for OffloadConfig {
    fn from(settings: &OffloadSettings) -> Self {
        settings
            .warn_after
            .map(Self::warn_after)
            .unwrap_or_default()
    }
}
