//! Socket timestamping configuration.
//!
//! Turns a timestamp class and a transport into kernel flags, negotiates the
//! hardware filter with the driver and records how transmit timestamps have
//! to be polled for on this particular socket.

use std::os::fd::{AsRawFd, RawFd};

use nix::poll::PollFlags;
use tracing::{debug, error, info, warn};

use super::hwts::{hwts_init, rx_filter};
use super::priority::set_priority;
use super::receive::KernelTimestamps;
use super::socket::SocketIo;
use crate::error::{Result, SocketError};
use crate::types::{SocketConfig, TimestampClass, TransportKind};

/// Poll events used while waiting for a transmit timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxPollMask {
    /// Events requested from `poll`.
    pub events: PollFlags,
    /// Returned events that count as "timestamp ready".
    pub revents: PollFlags,
}

impl TxPollMask {
    /// With `SO_SELECT_ERR_QUEUE`, error-queue data raises `POLLPRI`.
    #[must_use]
    pub fn err_queue_selected() -> Self {
        Self {
            events: PollFlags::POLLPRI,
            revents: PollFlags::POLLPRI,
        }
    }

    /// Without it only the implicit `POLLERR` tells us the queue has data.
    #[must_use]
    pub fn degraded() -> Self {
        Self {
            events: PollFlags::empty(),
            revents: PollFlags::POLLERR,
        }
    }
}

impl Default for TxPollMask {
    fn default() -> Self {
        Self::err_queue_selected()
    }
}

/// `SO_TIMESTAMPING` flags for a timestamp class.
#[must_use]
pub fn timestamping_flags(class: TimestampClass) -> u32 {
    match class {
        TimestampClass::Software => {
            libc::SOF_TIMESTAMPING_TX_SOFTWARE
                | libc::SOF_TIMESTAMPING_RX_SOFTWARE
                | libc::SOF_TIMESTAMPING_SOFTWARE
        }
        TimestampClass::Hardware | TimestampClass::OneStep => {
            libc::SOF_TIMESTAMPING_TX_HARDWARE
                | libc::SOF_TIMESTAMPING_RX_HARDWARE
                | libc::SOF_TIMESTAMPING_RAW_HARDWARE
        }
        TimestampClass::LegacyHardware => {
            libc::SOF_TIMESTAMPING_TX_HARDWARE
                | libc::SOF_TIMESTAMPING_RX_HARDWARE
                | libc::SOF_TIMESTAMPING_SYS_HARDWARE
        }
    }
}

/// Receive filter to retry with when the driver refuses `PTP_V2_EVENT`.
///
/// # Errors
/// [`SocketError::UnsupportedTransport`] for transports without a PTP
/// hardware filter.
pub fn fallback_filter(transport: TransportKind) -> Result<i32> {
    match transport {
        TransportKind::UdpIpv4 | TransportKind::UdpIpv6 => Ok(rx_filter::PTP_V2_L4_EVENT),
        TransportKind::Ieee8023 => Ok(rx_filter::PTP_V2_L2_EVENT),
        TransportKind::DeviceNet
        | TransportKind::ControlNet
        | TransportKind::Profinet
        | TransportKind::UnixDomain => Err(SocketError::UnsupportedTransport(transport)),
    }
}

/// Enable or disable the per-receive software timestamp (`SO_TIMESTAMPNS`).
///
/// # Errors
/// [`SocketError::SocketOption`] if the option cannot be set.
pub fn general_init<S: SocketIo + ?Sized>(io: &S, check_fupsync: bool) -> Result<()> {
    io.set_timestamp_ns(check_fupsync).map_err(|source| {
        error!("ioctl SO_TIMESTAMPNS failed: {}", source);
        SocketError::SocketOption {
            option: "SO_TIMESTAMPNS",
            source,
        }
    })
}

/// Configure `io` to timestamp event messages with `class`.
///
/// Returns the poll mask transmit-timestamp waits must use on this socket.
///
/// # Errors
/// Fails when the transport has no hardware filter, when the driver rejects
/// both the generic and the transport-specific filter, or when a required
/// socket option cannot be set. A missing `SO_SELECT_ERR_QUEUE` is not an
/// error; it only degrades the returned poll mask.
pub fn timestamping_init<S: SocketIo + ?Sized>(
    io: &S,
    device: &str,
    class: TimestampClass,
    transport: TransportKind,
    config: &SocketConfig,
) -> Result<TxPollMask> {
    let flags = timestamping_flags(class);

    if class.is_hardware() {
        let filter2 = fallback_filter(transport)?;
        let one_step = class == TimestampClass::OneStep;
        if hwts_init(io, device, rx_filter::PTP_V2_EVENT, one_step).is_err() {
            info!(device, "driver rejected most general HWTSTAMP filter");
            hwts_init(io, device, filter2, one_step).inspect_err(|e| {
                error!(device, "ioctl SIOCSHWTSTAMP failed: {}", e);
            })?;
        }
    }

    io.set_timestamping(flags).map_err(|source| {
        error!("ioctl SO_TIMESTAMPING failed: {}", source);
        SocketError::SocketOption {
            option: "SO_TIMESTAMPING",
            source,
        }
    })?;

    let tx_poll = match io.set_select_err_queue(true) {
        Ok(()) => TxPollMask::err_queue_selected(),
        Err(e) => {
            warn!(device, "SO_SELECT_ERR_QUEUE: {}", e);
            TxPollMask::degraded()
        }
    };

    general_init(io, config.check_fupsync)?;

    debug!(device, %class, %transport, flags, "timestamping enabled");
    Ok(tx_poll)
}

/// A socket configured for PTP timestamping.
///
/// Owns everything receive calls need: the socket, its timestamp class, its
/// private copy of the configuration, the negotiated transmit poll mask and
/// the receive strategy (plain kernel timestamps or transparent-clock
/// forwarding).
#[derive(Debug)]
pub struct TimestampedSocket<S, R = KernelTimestamps> {
    pub(crate) io: S,
    pub(crate) device: String,
    pub(crate) class: TimestampClass,
    pub(crate) transport: TransportKind,
    pub(crate) config: SocketConfig,
    pub(crate) tx_poll: TxPollMask,
    pub(crate) strategy: R,
}

impl<S: SocketIo> TimestampedSocket<S> {
    /// Configure `io` for `class` timestamps on `device`.
    ///
    /// # Errors
    /// See [`timestamping_init`].
    pub fn configure(
        io: S,
        device: &str,
        class: TimestampClass,
        transport: TransportKind,
        config: &SocketConfig,
    ) -> Result<Self> {
        let tx_poll = timestamping_init(&io, device, class, transport, config)?;
        Ok(Self {
            io,
            device: device.to_string(),
            class,
            transport,
            config: config.clone(),
            tx_poll,
            strategy: KernelTimestamps,
        })
    }
}

impl<S, R> TimestampedSocket<S, R> {
    /// Swap in a different receive strategy.
    #[must_use]
    pub fn with_strategy<R2>(self, strategy: R2) -> TimestampedSocket<S, R2> {
        TimestampedSocket {
            io: self.io,
            device: self.device,
            class: self.class,
            transport: self.transport,
            config: self.config,
            tx_poll: self.tx_poll,
            strategy,
        }
    }

    /// The underlying socket.
    pub fn io(&self) -> &S {
        &self.io
    }

    /// Interface the socket was configured on.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Timestamp class chosen at configuration time.
    pub fn class(&self) -> TimestampClass {
        self.class
    }

    /// Transport chosen at configuration time.
    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// The configuration this socket was set up with.
    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    /// Poll mask used for transmit timestamps.
    pub fn tx_poll(&self) -> TxPollMask {
        self.tx_poll
    }

    /// The receive strategy.
    pub fn strategy(&self) -> &R {
        &self.strategy
    }

    /// The receive strategy, mutably.
    pub fn strategy_mut(&mut self) -> &mut R {
        &mut self.strategy
    }

    /// Release the socket.
    pub fn into_inner(self) -> S {
        self.io
    }
}

impl<S: SocketIo, R> TimestampedSocket<S, R> {
    /// Set the DSCP codepoint of outgoing packets.
    ///
    /// # Errors
    /// See [`set_priority`].
    pub fn set_priority(&self, dscp: u8) -> Result<()> {
        set_priority(&self.io, dscp)
    }
}

impl<S: AsRawFd, R> AsRawFd for TimestampedSocket<S, R> {
    fn as_raw_fd(&self) -> RawFd {
        self.io.as_raw_fd()
    }
}
