use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::types::{AddressFamily, TransportKind};

/// Errors that can occur while configuring or using a timestamping socket
#[derive(Debug, Error)]
pub enum SocketError {
    // ===== Resource Errors =====
    /// Creating a socket or other descriptor failed
    #[error("{op} failed: {source}")]
    Resource {
        /// The system call that failed
        op: &'static str,
        /// The underlying OS error
        #[source]
        source: io::Error,
    },

    /// Interface lookup ioctl failed
    #[error("ioctl {request} on {device} failed: {source}")]
    InterfaceQuery {
        /// The ioctl request name
        request: &'static str,
        /// The interface name
        device: String,
        /// The underlying OS error
        #[source]
        source: io::Error,
    },

    /// Interface name does not fit `IFNAMSIZ` or contains a NUL byte
    #[error("invalid interface name: {name:?}")]
    InvalidInterfaceName {
        /// The rejected name
        name: String,
    },

    /// No local address of the requested family on the interface
    #[error("no {family:?} address on {device}")]
    AddressNotFound {
        /// The interface name
        device: String,
        /// The requested family
        family: AddressFamily,
    },

    // ===== Negotiation Errors =====
    /// The driver rejected `SIOCSHWTSTAMP` outright
    #[error("SIOCSHWTSTAMP on {device} failed: {source}")]
    DeviceRejected {
        /// The interface name
        device: String,
        /// The underlying OS error
        #[source]
        source: io::Error,
    },

    /// The driver granted a different transmit mode than requested
    #[error("driver changed tx_type on {device}: requested {requested}, got {granted}")]
    TxTypeChanged {
        /// The interface name
        device: String,
        /// Requested `HWTSTAMP_TX_*`
        requested: i32,
        /// Granted `HWTSTAMP_TX_*`
        granted: i32,
    },

    /// The driver substituted an unusable receive filter
    #[error("driver changed rx_filter on {device}: requested {requested}, got {granted}")]
    RxFilterRejected {
        /// The interface name
        device: String,
        /// Requested `HWTSTAMP_FILTER_*`
        requested: i32,
        /// Granted `HWTSTAMP_FILTER_*`
        granted: i32,
    },

    /// Hardware timestamping is not defined for this transport
    #[error("hardware timestamping not supported on {0} transport")]
    UnsupportedTransport(TransportKind),

    /// Setting a socket option failed
    #[error("setsockopt {option} failed: {source}")]
    SocketOption {
        /// The option name
        option: &'static str,
        /// The underlying OS error
        #[source]
        source: io::Error,
    },

    // ===== Timing Errors =====
    /// No transmit timestamp arrived within the timeout
    #[error("timed out after {timeout:?} while polling for tx timestamp")]
    TxTimestampTimeout {
        /// The configured timeout
        timeout: Duration,
    },

    /// `poll(2)` itself failed
    #[error("poll failed: {0}")]
    Poll(#[source] io::Error),

    /// Poll woke up on an event other than the expected error-queue event
    #[error("poll for tx timestamp woke up on non ERR event (revents {revents:#06x})")]
    UnexpectedPollEvent {
        /// The returned event bits
        revents: i16,
    },

    // ===== Receive Errors =====
    /// `recvmsg(2)` failed
    #[error("recvmsg{} failed: {source}", queue_label(.error_queue))]
    Receive {
        /// Whether the error queue was read
        error_queue: bool,
        /// The underlying OS error
        #[source]
        source: io::Error,
    },

    /// An ancillary timestamp record was shorter than its type requires
    #[error("short {record} message: {len} bytes, need {expected}")]
    MalformedAncillary {
        /// The control message type
        record: &'static str,
        /// Payload length received
        len: usize,
        /// Payload length required
        expected: usize,
    },

    // ===== Transparent Clock Errors =====
    /// The meta-data frame for a received event message did not arrive intact
    #[error("meta frame unavailable: {reason}")]
    MetaFrame {
        /// What went wrong
        reason: String,
    },

    /// A switch management channel request failed
    #[error("switch {op} failed: {source}")]
    Switch {
        /// The switch operation
        op: &'static str,
        /// The underlying error
        #[source]
        source: io::Error,
    },

    /// Forwarding the event message failed
    #[error("failed to forward message: {0}")]
    Forward(#[source] io::Error),

    /// The frame is not a PTP message this layer can forward
    #[error("malformed PTP frame: {0}")]
    Frame(#[from] crate::protocol::ptp::PtpParseError),
}

impl SocketError {
    /// Whether this error is a bounded wait that ran out or woke up wrongly
    ///
    /// Timing errors mean "try again"; everything else points at a broken
    /// configuration or device.
    #[must_use]
    pub fn is_timing(&self) -> bool {
        matches!(
            self,
            Self::TxTimestampTimeout { .. } | Self::Poll(_) | Self::UnexpectedPollEvent { .. }
        )
    }

    /// Check if the socket stays usable after this error
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.is_timing()
            || matches!(
                self,
                Self::MalformedAncillary { .. }
                    | Self::MetaFrame { .. }
                    | Self::Frame(_)
                    | Self::Receive { .. }
            )
    }

    /// The underlying OS error code, if any
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Resource { source, .. }
            | Self::InterfaceQuery { source, .. }
            | Self::DeviceRejected { source, .. }
            | Self::SocketOption { source, .. }
            | Self::Receive { source, .. }
            | Self::Switch { source, .. }
            | Self::Poll(source)
            | Self::Forward(source) => source.raw_os_error(),
            _ => None,
        }
    }
}

fn queue_label(error_queue: &bool) -> &'static str {
    if *error_queue { " tx timestamp" } else { "" }
}

/// Result type alias for timestamping socket operations
pub type Result<T> = std::result::Result<T, SocketError>;
