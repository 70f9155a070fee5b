use serde::{Deserialize, Serialize};

use crate::utils::CCStr;

/// Per-instance settings of a [`Fetcher`](crate::lifecycle::fetcher::Fetcher).
///
/// Every field has a default, so a partial document deserializes fine:
///
/// ```ignore
/// let config: LifecycleConfig = serde_json::from_str(r#"{ "name": "user-card" }"#)?;
/// assert!(config.observe_mounts);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Label used in log lines emitted by the instance
    pub name: CCStr,
    /// Register mount hooks at all. Turn off when there is no live view (e.g. rendering
    /// to a string on a server): only `prefetch` then drives fetching.
    pub observe_mounts: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            name: CCStr::from("fetcher"),
            observe_mounts: true,
        }
    }
}

impl LifecycleConfig {
    pub fn named(name: impl Into<CCStr>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
