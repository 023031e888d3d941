//! Persistence service configuration.

use crate::entity::RecordId;

/// Configuration for building a persistence service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Id given to the seed table's own seed row during bootstrap.
    ///
    /// The seed table's counter ends at this value, so the next seed row
    /// (the first registered table) gets `bootstrap_id + 1`.
    pub bootstrap_id: RecordId,

    /// Whether to maintain operation counters.
    pub collect_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bootstrap_id: RecordId::new(1),
            collect_stats: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id of the seed table's own seed row.
    #[must_use]
    pub const fn bootstrap_id(mut self, id: RecordId) -> Self {
        self.bootstrap_id = id;
        self
    }

    /// Sets whether operation counters are maintained.
    #[must_use]
    pub const fn collect_stats(mut self, value: bool) -> Self {
        self.collect_stats = value;
        self
    }
}
