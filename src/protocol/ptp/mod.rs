//! Precision Time Protocol (PTP, IEEE 1588) primitives.
//!
//! This layer never decodes whole messages. It needs the timestamp type
//! shared by every component and in-place access to a handful of header
//! fields for transparent-clock forwarding.
//!
//! ## Standard PTP Ports
//!
//! - **319**: Event messages (Sync, `Delay_Req`), which need timestamps.
//! - **320**: General messages (`Follow_Up`, `Delay_Resp`, Announce).

pub mod message;
pub mod timestamp;

#[cfg(test)]
mod tests;

/// Standard PTP event port (Sync, `Delay_Req`).
pub const PTP_EVENT_PORT: u16 = 319;

/// Standard PTP general port (`Follow_Up`, `Delay_Resp`, Announce).
pub const PTP_GENERAL_PORT: u16 = 320;

/// Ethertype of PTP over IEEE 802.3.
pub const PTP_ETHERTYPE: u16 = 0x88F7;

// Re-exports for convenient access.
pub use message::{PtpHeaderView, PtpMessageType, PtpParseError};
pub use timestamp::PtpTimestamp;
