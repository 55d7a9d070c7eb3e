//! Socket layer
//!
//! Interface queries, hardware timestamp negotiation, socket configuration
//! and the timestamped receive pipeline.

pub mod cmsg;
pub mod hwts;
pub mod interface;
mod priority;
mod receive;
mod socket;
mod sys;
mod timestamping;

#[cfg(feature = "tokio-runtime")]
mod tokio_impl;

#[cfg(test)]
mod tests;

pub use cmsg::{AncillaryTimestamps, KernelTimestamp, parse_ancillary};
pub use hwts::{HwTstampConfig, hwts_init};
pub use interface::{
    control_socket, interface_addr, interface_index, interface_mac, timestamp_capabilities,
};
pub use priority::set_priority;
pub use receive::{KernelTimestamps, ReceiveStrategy, Reception, RecvMode, RxOutcome};
pub use socket::{PtpSocket, RecvMeta, SocketIo};
pub use timestamping::{
    TimestampedSocket, TxPollMask, fallback_filter, general_init, timestamping_flags,
    timestamping_init,
};

#[cfg(feature = "tokio-runtime")]
pub use tokio_impl::AsyncTimestampedSocket;
