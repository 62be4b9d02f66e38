//! Node configuration.

use crate::error::FactoryError;
use crate::io::MAX_BUFFERS;
use crate::plugin::Dict;

pub const KEY_NODE_NAME: &str = "node.name";
pub const KEY_MAX_BUFFERS: &str = "node.max-buffers";
pub const KEY_REPORT_INTERVAL: &str = "node.report-interval";
pub const KEY_REPORT_QUEUE_SIZE: &str = "node.report-queue-size";

/// Settings fixed at construction time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Name used in log records
    pub name: String,
    /// Highest buffer index accepted from an exchange table (exclusive), at
    /// least 1
    pub max_buffers: u32,
    /// Emit a statistics report every this many consumed buffers (0 disables)
    pub report_interval: u64,
    /// Capacity of the real-time report queue
    pub report_queue_size: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            name: String::from("null-sink"),
            max_buffers: MAX_BUFFERS,
            report_interval: 1000,
            report_queue_size: 64,
        }
    }
}

impl SinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the buffer index bound (at least 1)
    pub fn with_max_buffers(mut self, max_buffers: u32) -> Self {
        self.max_buffers = max_buffers.max(1);
        self
    }

    pub fn with_report_interval(mut self, buffers: u64) -> Self {
        self.report_interval = buffers;
        self
    }

    /// Set the report queue capacity (at least 1)
    pub fn with_report_queue_size(mut self, size: usize) -> Self {
        self.report_queue_size = size.max(1);
        self
    }

    /// Build a config from factory info properties, starting from defaults.
    ///
    /// Unknown keys are ignored.
    pub fn from_dict(dict: &Dict) -> Result<Self, FactoryError> {
        let mut config = Self::default();

        if let Some(name) = dict.get(KEY_NODE_NAME) {
            config.name = name.to_string();
        }
        if let Some(v) = dict.get(KEY_MAX_BUFFERS) {
            config.max_buffers = parse(KEY_MAX_BUFFERS, v)?;
            // a sink that accepts no index would reject every buffer
            if config.max_buffers == 0 {
                return Err(invalid(KEY_MAX_BUFFERS, v));
            }
        }
        if let Some(v) = dict.get(KEY_REPORT_INTERVAL) {
            config.report_interval = parse(KEY_REPORT_INTERVAL, v)?;
        }
        if let Some(v) = dict.get(KEY_REPORT_QUEUE_SIZE) {
            let size: usize = parse(KEY_REPORT_QUEUE_SIZE, v)?;
            config = config.with_report_queue_size(size);
        }

        Ok(config)
    }
}

fn parse<T: core::str::FromStr>(key: &str, value: &str) -> Result<T, FactoryError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> FactoryError {
    FactoryError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
    }
}
