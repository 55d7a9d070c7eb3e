//! Core types module

mod address;
mod config;
mod timestamp;

#[cfg(test)]
mod tests;

pub use address::{Address, AddressFamily, LinkAddr, MAC_LEN, MacAddr, SockAddr};
pub use config::{SocketConfig, SocketConfigBuilder, TransparentClockConfig};
pub use timestamp::{HardwareTimestamp, TimestampCapabilities, TimestampClass, TransportKind};
