use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for timestamping sockets
///
/// Every socket configured with a given `SocketConfig` keeps its own copy, so
/// changing a config only affects sockets configured afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    /// How long to wait for a transmit timestamp on the error queue (default: 1ms)
    #[serde(with = "duration_ms", rename = "tx_timestamp_timeout_ms")]
    pub tx_timeout: Duration,

    /// Also deliver a software timestamp on every receive (default: false)
    ///
    /// Lets callers compare hardware timestamps against the system clock to
    /// detect Sync/`Follow_Up` mismatches.
    pub check_fupsync: bool,

    /// Transparent-clock forwarding settings
    pub transparent_clock: TransparentClockConfig,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            tx_timeout: Duration::from_millis(1),
            check_fupsync: false,
            transparent_clock: TransparentClockConfig::default(),
        }
    }
}

impl SocketConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> SocketConfigBuilder {
        SocketConfigBuilder::default()
    }
}

/// Builder for `SocketConfig`
#[derive(Debug, Clone, Default)]
pub struct SocketConfigBuilder {
    config: SocketConfig,
}

impl SocketConfigBuilder {
    /// Set the transmit timestamp timeout
    #[must_use]
    pub fn tx_timeout(mut self, timeout: Duration) -> Self {
        self.config.tx_timeout = timeout;
        self
    }

    /// Enable the software fallback timestamp on every receive
    #[must_use]
    pub fn check_fupsync(mut self, enable: bool) -> Self {
        self.config.check_fupsync = enable;
        self
    }

    /// Set the meta-data frame timeout for transparent-clock forwarding
    #[must_use]
    pub fn meta_timeout(mut self, timeout: Duration) -> Self {
        self.config.transparent_clock.meta_timeout = timeout;
        self
    }

    /// Replace the transparent-clock settings
    #[must_use]
    pub fn transparent_clock(mut self, tc: TransparentClockConfig) -> Self {
        self.config.transparent_clock = tc;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> SocketConfig {
        self.config
    }
}

/// Switch fabric layout and timing for transparent-clock forwarding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransparentClockConfig {
    /// How long to wait for the meta-data frame after an event message (default: 1ms)
    #[serde(with = "duration_ms", rename = "meta_timeout_ms")]
    pub meta_timeout: Duration,

    /// Bit mask of every switch port (default: 0x1F, five ports)
    pub port_mask: u8,

    /// Port number of the CPU-facing host port (default: 4)
    pub host_port: u8,

    /// Management route slot used for forwarded frames (default: 0)
    pub mgmt_index: u8,

    /// Egress timestamp register requested in management entries (default: 0)
    pub ts_regid: u8,

    /// Reads of the egress timestamp register before giving up (default: 10)
    pub egress_poll_attempts: u32,

    /// Fabric tick length in nanoseconds (default: 8)
    pub tick_ns: u64,
}

impl Default for TransparentClockConfig {
    fn default() -> Self {
        Self {
            meta_timeout: Duration::from_millis(1),
            port_mask: 0x1F,
            host_port: 4,
            mgmt_index: 0,
            ts_regid: 0,
            egress_poll_attempts: 10,
            tick_ns: 8,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Millisecond timeouts never approach u64::MAX"
    )]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
