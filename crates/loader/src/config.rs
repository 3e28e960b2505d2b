use std::time::Duration;

/// Configuration for a batch loader instance.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of distinct keys dispatched in a single bulk fetch.
    /// Reaching this threshold closes the open batch immediately.
    pub max_batch: usize,
    /// How long a batch stays open for further keys, measured from the
    /// moment it received its first key.
    pub wait: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch: 100,
            wait: Duration::from_millis(5),
        }
    }
}
