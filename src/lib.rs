//! # ptp-timestamping
//!
//! Socket and hardware timestamping layer for a Precision Time Protocol
//! (IEEE 1588) endpoint.
//!
//! ## Features
//!
//! - Software, hardware, one-step and legacy hardware timestamps
//! - Driver filter negotiation with transport-specific fallback
//! - Transmit timestamps from the socket error queue
//! - DSCP marking
//! - Transparent-clock forwarding through a timestamping switch
//!
//! ## Example
//!
//! ```rust,no_run
//! use ptp_timestamping::net::{PtpSocket, RecvMode, TimestampedSocket};
//! use ptp_timestamping::{SocketConfig, TimestampClass, TransportKind};
//!
//! # fn example() -> Result<(), ptp_timestamping::SocketError> {
//! let udp = std::net::UdpSocket::bind("0.0.0.0:319").expect("bind");
//! let config = SocketConfig::default();
//!
//! let mut sock = TimestampedSocket::configure(
//!     PtpSocket::from(udp),
//!     "eth0",
//!     TimestampClass::Hardware,
//!     TransportKind::UdpIpv4,
//!     &config,
//! )?;
//!
//! let mut buf = [0u8; 1500];
//! let rx = sock.receive(&mut buf, None, RecvMode::Normal)?;
//! println!("{} bytes at {}", rx.len, rx.hwts.value());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Configuration**: [`net::TimestampedSocket::configure`] negotiates with
//!   the driver and enables kernel timestamp delivery
//! - **Receive**: [`net::TimestampedSocket::receive`] returns payload and
//!   timestamps; the receive strategy decides what happens in between
//! - **Forwarding**: [`tc::TransparentClock`] is the strategy for ports
//!   behind a timestamping switch

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// Core types
pub mod types;

/// Testing utilities
pub mod testing;

pub mod net;
pub mod protocol;
pub mod tc;

// Re-exports
pub use error::{Result, SocketError};
pub use net::{PtpSocket, RecvMode, TimestampedSocket};
pub use protocol::ptp::PtpTimestamp;
pub use types::{
    Address, HardwareTimestamp, SocketConfig, TimestampCapabilities, TimestampClass,
    TransparentClockConfig, TransportKind,
};

#[cfg(feature = "tokio-runtime")]
pub use net::AsyncTimestampedSocket;
