use serde::{Deserialize, Serialize};

use crate::protocol::ptp::PtpTimestamp;

/// Which clock stamps event messages on a socket.
///
/// Chosen when the socket is configured and fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampClass {
    /// Kernel software timestamps.
    Software,
    /// Raw hardware (PHC) timestamps, two-step.
    Hardware,
    /// Raw hardware timestamps with one-step Sync insertion by the NIC.
    OneStep,
    /// Hardware timestamps transformed to system time by the driver.
    LegacyHardware,
}

impl TimestampClass {
    /// Whether this class needs the driver's hardware timestamping unit.
    #[must_use]
    pub fn is_hardware(self) -> bool {
        !matches!(self, Self::Software)
    }

    /// Slot of the `SO_TIMESTAMPING` triple this class reads.
    #[must_use]
    pub fn timestamping_index(self) -> usize {
        match self {
            Self::Software => 0,
            Self::LegacyHardware => 1,
            Self::Hardware | Self::OneStep => 2,
        }
    }
}

impl std::fmt::Display for TimestampClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Software => write!(f, "software"),
            Self::Hardware => write!(f, "hardware"),
            Self::OneStep => write!(f, "one-step"),
            Self::LegacyHardware => write!(f, "legacy-hardware"),
        }
    }
}

/// Network transports a PTP port may run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// UDP over IPv4 (Annex D).
    UdpIpv4,
    /// UDP over IPv6 (Annex E).
    UdpIpv6,
    /// Raw IEEE 802.3 Ethernet (Annex F).
    Ieee8023,
    /// `DeviceNet` (Annex G).
    DeviceNet,
    /// `ControlNet` (Annex H).
    ControlNet,
    /// PROFINET (Annex I).
    Profinet,
    /// Unix domain sockets, used for local management.
    UnixDomain,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UdpIpv4 => write!(f, "UDPv4"),
            Self::UdpIpv6 => write!(f, "UDPv6"),
            Self::Ieee8023 => write!(f, "L2"),
            Self::DeviceNet => write!(f, "DeviceNet"),
            Self::ControlNet => write!(f, "ControlNet"),
            Self::Profinet => write!(f, "PROFINET"),
            Self::UnixDomain => write!(f, "UDS"),
        }
    }
}

/// Timestamp attached to one received packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareTimestamp {
    /// Class the socket was configured with.
    pub class: TimestampClass,
    /// Primary timestamp; `None` when the kernel attached none.
    pub ts: Option<PtpTimestamp>,
    /// Software fallback timestamp (`SO_TIMESTAMPNS`), when enabled.
    pub sw: Option<PtpTimestamp>,
}

impl HardwareTimestamp {
    /// An empty timestamp for a socket of the given class.
    #[must_use]
    pub fn new(class: TimestampClass) -> Self {
        Self {
            class,
            ts: None,
            sw: None,
        }
    }

    /// Primary timestamp, zero when absent.
    #[must_use]
    pub fn value(&self) -> PtpTimestamp {
        self.ts.unwrap_or(PtpTimestamp::ZERO)
    }
}

/// Driver-reported timestamping capabilities of an interface.
///
/// A snapshot from `ETHTOOL_GET_TS_INFO`. When the query fails every field is
/// zero and `valid` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimestampCapabilities {
    /// Whether the driver answered the query.
    pub valid: bool,
    /// Index of the PTP hardware clock, `-1` when the device has none.
    pub phc_index: i32,
    /// Supported `SOF_TIMESTAMPING_*` flags.
    pub so_timestamping: u32,
    /// Bit set of supported `HWTSTAMP_TX_*` types.
    pub tx_types: u32,
    /// Bit set of supported `HWTSTAMP_FILTER_*` receive filters.
    pub rx_filters: u32,
}

impl TimestampCapabilities {
    /// Whether the given `SOF_TIMESTAMPING_*` flags are all supported.
    #[must_use]
    pub fn supports_flags(&self, flags: u32) -> bool {
        self.valid && self.so_timestamping & flags == flags
    }

    /// Whether the given `HWTSTAMP_TX_*` type is supported.
    #[must_use]
    pub fn supports_tx_type(&self, tx_type: i32) -> bool {
        self.valid && (0..32).contains(&tx_type) && self.tx_types & (1 << tx_type) != 0
    }

    /// Whether the given `HWTSTAMP_FILTER_*` receive filter is supported.
    #[must_use]
    pub fn supports_rx_filter(&self, filter: i32) -> bool {
        self.valid && (0..32).contains(&filter) && self.rx_filters & (1 << filter) != 0
    }

    /// The PHC index, if the device has one.
    #[must_use]
    pub fn phc(&self) -> Option<u32> {
        if self.valid {
            u32::try_from(self.phc_index).ok()
        } else {
            None
        }
    }
}
