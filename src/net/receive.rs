//! Receive pipeline.
//!
//! One receive call optionally waits for the error queue, pulls payload,
//! peer name and control data with a single `recvmsg`, and turns the control
//! data into a [`HardwareTimestamp`]. What happens between parsing and
//! returning is up to the socket's [`ReceiveStrategy`].

use tracing::{error, trace};

use super::cmsg::{AncillaryTimestamps, CONTROL_LEN, parse_ancillary};
use super::socket::SocketIo;
use super::timestamping::TimestampedSocket;
use crate::error::{Result, SocketError};
use crate::protocol::ptp::PtpTimestamp;
use crate::tc::ForwardOutcome;
use crate::types::{Address, HardwareTimestamp, TimestampClass};

/// Where a receive reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecvMode {
    /// The regular receive queue; blocks until a packet arrives.
    #[default]
    Normal,
    /// The error queue, where transmit timestamps are looped back. Bounded
    /// by the socket's transmit timestamp timeout.
    ErrorQueue,
}

impl RecvMode {
    fn is_error_queue(self) -> bool {
        self == Self::ErrorQueue
    }
}

/// Result of one successful receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reception {
    /// Payload bytes written into the caller's buffer.
    pub len: usize,
    /// Timestamps attached to the packet.
    pub hwts: HardwareTimestamp,
    /// Set when a transparent-clock strategy forwarded the packet.
    pub forward: Option<ForwardOutcome>,
}

/// What a strategy decided for one received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxOutcome {
    /// Primary timestamp to report.
    pub ts: Option<PtpTimestamp>,
    /// Forwarding result, for strategies that forward.
    pub forward: Option<ForwardOutcome>,
}

/// Decides the primary receive timestamp for normal receives.
///
/// `io` is the data socket the frame arrived on. `frame` is the received
/// payload and may be modified in place.
pub trait ReceiveStrategy<S: ?Sized> {
    /// Produce the timestamp (and any side effects) for one received frame.
    ///
    /// # Errors
    /// Strategy specific; the receive call returns the error unchanged.
    fn on_receive(
        &mut self,
        io: &S,
        frame: &mut [u8],
        ancillary: &AncillaryTimestamps,
        class: TimestampClass,
    ) -> Result<RxOutcome>;
}

impl<S: ?Sized, T: ReceiveStrategy<S> + ?Sized> ReceiveStrategy<S> for Box<T> {
    fn on_receive(
        &mut self,
        io: &S,
        frame: &mut [u8],
        ancillary: &AncillaryTimestamps,
        class: TimestampClass,
    ) -> Result<RxOutcome> {
        (**self).on_receive(io, frame, ancillary, class)
    }
}

/// Report whatever the kernel attached, selected by timestamp class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelTimestamps;

impl KernelTimestamps {
    fn select(ancillary: &AncillaryTimestamps, class: TimestampClass) -> RxOutcome {
        RxOutcome {
            ts: ancillary.select(class).timestamp(),
            forward: None,
        }
    }
}

impl<S: ?Sized> ReceiveStrategy<S> for KernelTimestamps {
    fn on_receive(
        &mut self,
        _io: &S,
        _frame: &mut [u8],
        ancillary: &AncillaryTimestamps,
        class: TimestampClass,
    ) -> Result<RxOutcome> {
        Ok(Self::select(ancillary, class))
    }
}

const TX_TIMEOUT_HINT: &str =
    "increasing tx_timestamp_timeout may correct this issue, but it is likely caused by a driver bug";

impl<S: SocketIo, R: ReceiveStrategy<S>> TimestampedSocket<S, R> {
    /// Receive one packet together with its timestamps.
    ///
    /// When `addr` is given it is overwritten with the peer name and the
    /// length the kernel reported.
    ///
    /// # Errors
    /// Timing errors (error queue only), [`SocketError::Receive`],
    /// [`SocketError::MalformedAncillary`] and whatever the strategy returns.
    pub fn receive(
        &mut self,
        buf: &mut [u8],
        addr: Option<&mut Address>,
        mode: RecvMode,
    ) -> Result<Reception> {
        if mode.is_error_queue() {
            self.wait_tx_timestamp()?;
        }

        let mut control = [0u8; CONTROL_LEN];
        let meta = self
            .io
            .recv_msg(buf, &mut control, mode.is_error_queue())
            .map_err(|source| {
                if source.kind() != std::io::ErrorKind::WouldBlock {
                    error!(
                        "recvmsg{} failed: {}",
                        if mode.is_error_queue() { " tx timestamp" } else { "" },
                        source
                    );
                }
                SocketError::Receive {
                    error_queue: mode.is_error_queue(),
                    source,
                }
            })?;

        if let Some(addr) = addr {
            *addr = meta.name;
        }

        let ancillary = parse_ancillary(&control[..meta.control_len])?;
        let mut hwts = HardwareTimestamp::new(self.class);
        hwts.sw = ancillary.software;

        let len = meta.len.min(buf.len());
        let outcome = match mode {
            RecvMode::ErrorQueue => KernelTimestamps::select(&ancillary, self.class),
            RecvMode::Normal => {
                self.strategy
                    .on_receive(&self.io, &mut buf[..len], &ancillary, self.class)?
            }
        };
        hwts.ts = outcome.ts;

        trace!(len, ts = ?hwts.ts, "received");
        Ok(Reception {
            len: meta.len,
            hwts,
            forward: outcome.forward,
        })
    }

    fn wait_tx_timestamp(&self) -> Result<()> {
        let timeout = self.config.tx_timeout;
        match self.io.poll(self.tx_poll.events, timeout) {
            Ok(Some(revents)) if revents.intersects(self.tx_poll.revents) => Ok(()),
            Ok(Some(revents)) => {
                error!("poll for tx timestamp woke up on non ERR event");
                Err(SocketError::UnexpectedPollEvent {
                    revents: revents.bits(),
                })
            }
            Ok(None) => {
                error!("timed out while polling for tx timestamp");
                error!("{}", TX_TIMEOUT_HINT);
                Err(SocketError::TxTimestampTimeout { timeout })
            }
            Err(e) => {
                error!("poll for tx timestamp failed: {}", e);
                error!("{}", TX_TIMEOUT_HINT);
                Err(SocketError::Poll(e))
            }
        }
    }
}

