//! Transparent-clock forwarding
//!
//! On a host wired to the CPU port of a timestamping switch, event messages
//! are trapped to the host, re-timed from the switch's meta-data frames and
//! sent back out through a one-shot management route. The egress timestamp
//! of each forwarded Sync is later written into the matching `Follow_Up`.
//!
//! Install a [`TransparentClock`] as the receive strategy of a
//! [`TimestampedSocket`](crate::net::TimestampedSocket) to enable it.

mod forward;
mod meta;
mod state;
mod switch;

#[cfg(test)]
mod tests;

pub use forward::{ForwardOutcome, TransparentClock};
pub use meta::{ETH_HLEN, META_TS_MASK, MetaDataFrame, reconstruct_rx_timestamp};
pub use state::{RetainedSync, TransparentClockState};
pub use switch::{SwitchFabric, SwitchManagementEntry};
