//! Event message forwarding through a timestamping switch.

use std::io;

use nix::poll::PollFlags;
use tracing::{debug, error, warn};

use super::meta::{ETH_HLEN, MetaDataFrame, reconstruct_rx_timestamp};
use super::state::TransparentClockState;
use super::switch::{SwitchFabric, SwitchManagementEntry};
use crate::error::{Result, SocketError};
use crate::net::cmsg::{AncillaryTimestamps, CONTROL_LEN};
use crate::net::{ReceiveStrategy, RxOutcome, SocketIo, TimestampedSocket};
use crate::protocol::ptp::{PtpHeaderView, PtpMessageType, PtpParseError, PtpTimestamp};
use crate::types::{TimestampClass, TransparentClockConfig};

/// What happened to one forwarded event message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOutcome {
    /// Type of the forwarded message.
    pub message_type: PtpMessageType,
    /// Its sequence ID.
    pub sequence_id: u16,
    /// Switch port the message came in on.
    pub src_port: u8,
    /// Ports it was routed to.
    pub destports: u8,
    /// Whether a `Follow_Up` correction was written before sending.
    pub correction_applied: bool,
    /// Egress timestamp, when the switch captured one in time.
    pub egress: Option<PtpTimestamp>,
}

/// Receive strategy that re-times and forwards every event message.
///
/// `F` is the switch management channel and `M` the socket meta-data
/// frames arrive on. Owns the per-port [`TransparentClockState`]. Built by
/// [`TimestampedSocket::into_transparent_clock`] so its settings always
/// come from the socket's [`SocketConfig`](crate::types::SocketConfig).
#[derive(Debug)]
pub struct TransparentClock<F, M> {
    fabric: F,
    meta: M,
    config: TransparentClockConfig,
    state: TransparentClockState,
    last: Option<ForwardOutcome>,
}

impl<F: SwitchFabric, M: SocketIo> TransparentClock<F, M> {
    /// Create a forwarder with fresh state.
    pub(crate) fn new(fabric: F, meta: M, config: TransparentClockConfig) -> Self {
        Self {
            fabric,
            meta,
            config,
            state: TransparentClockState::new(),
            last: None,
        }
    }

    /// Per-port state.
    pub fn state(&self) -> &TransparentClockState {
        &self.state
    }

    /// Per-port state, mutably (master setup, retained Sync).
    pub fn state_mut(&mut self) -> &mut TransparentClockState {
        &mut self.state
    }

    /// Outcome of the most recent forward.
    pub fn last_outcome(&self) -> Option<ForwardOutcome> {
        self.last
    }

    /// Forget all state, e.g. after the transport was reconfigured.
    pub fn reset(&mut self) {
        self.state.reset();
        self.last = None;
    }

    /// The switch management channel.
    pub fn fabric(&self) -> &F {
        &self.fabric
    }

    /// The switch management channel, mutably.
    pub fn fabric_mut(&mut self) -> &mut F {
        &mut self.fabric
    }

    /// The meta-data channel.
    pub fn meta(&self) -> &M {
        &self.meta
    }

    /// Forwarding settings.
    pub fn config(&self) -> &TransparentClockConfig {
        &self.config
    }

    fn receive_meta(&self) -> Result<MetaDataFrame> {
        let timeout = self.config.meta_timeout;
        match self.meta.poll(PollFlags::POLLIN | PollFlags::POLLPRI, timeout) {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(?timeout, "timed out polling for meta frame");
                return Err(SocketError::MetaFrame {
                    reason: format!("timed out after {timeout:?}"),
                });
            }
            Err(e) => {
                warn!("failed to poll meta channel: {}", e);
                return Err(SocketError::MetaFrame {
                    reason: format!("poll failed: {e}"),
                });
            }
        }

        let mut frame = [0u8; MetaDataFrame::FRAME_LEN];
        let mut control = [0u8; CONTROL_LEN];
        let received = self
            .meta
            .recv_msg(&mut frame, &mut control, false)
            .map_err(|e| {
                warn!("failed to receive meta frame: {}", e);
                SocketError::MetaFrame {
                    reason: format!("recvmsg failed: {e}"),
                }
            })?;

        MetaDataFrame::from_frame(&frame[..received.len.min(frame.len())])
            .inspect_err(|e| warn!("{}", e))
    }

    fn switch_error(op: &'static str) -> impl FnOnce(io::Error) -> SocketError {
        move |source| {
            error!("switch {} failed: {}", op, source);
            SocketError::Switch { op, source }
        }
    }

    fn forward<S: SocketIo + ?Sized>(
        &mut self,
        io: &S,
        frame: &mut [u8],
    ) -> Result<(PtpTimestamp, ForwardOutcome)> {
        let meta = self.receive_meta()?;

        // Nothing reaches the switch for a frame that will not be sent.
        if frame.len() < ETH_HLEN {
            return Err(PtpParseError::TooShort {
                needed: ETH_HLEN + PtpHeaderView::<&[u8]>::SIZE,
                have: frame.len(),
            }
            .into());
        }
        let (message_type, sequence_id, message_length) = {
            let header = PtpHeaderView::new(&frame[ETH_HLEN..])?;
            (
                header.message_type()?,
                header.sequence_id(),
                usize::from(header.message_length()),
            )
        };

        let coarse = self
            .fabric
            .clock_time()
            .map_err(Self::switch_error("clock read"))?;
        let rx_ts = reconstruct_rx_timestamp(coarse, meta.rx_ts_low(), self.config.tick_ns.max(1));

        let entry = SwitchManagementEntry::for_ingress(
            self.config.port_mask,
            self.config.host_port,
            meta.src_port,
            self.config.ts_regid,
        );
        self.fabric
            .set_mgmt_route(&entry, self.config.mgmt_index)
            .map_err(Self::switch_error("management route"))?;

        let correction_applied = self.state.insert_correction(&mut frame[ETH_HLEN..])?;

        let send_len = (ETH_HLEN + message_length).min(frame.len());
        let sent = io.send(&frame[..send_len]).map_err(|e| {
            error!("failed to forward message: {}", e);
            SocketError::Forward(e)
        })?;
        if sent == 0 {
            error!("failed to forward message: nothing sent");
            return Err(SocketError::Forward(io::ErrorKind::WriteZero.into()));
        }

        let egress = match self.fabric.poll_egress_timestamp(
            entry.egress_port(),
            self.config.ts_regid,
            self.config.egress_poll_attempts,
        ) {
            Ok(Some(ts)) => Some(ts),
            Ok(None) => {
                warn!(port = entry.egress_port(), "no updated tx timestamp");
                None
            }
            Err(e) => {
                warn!(port = entry.egress_port(), "egress timestamp poll failed: {}", e);
                None
            }
        };
        self.state.record_forward(message_type, sequence_id, egress);

        let outcome = ForwardOutcome {
            message_type,
            sequence_id,
            src_port: meta.src_port,
            destports: entry.destports,
            correction_applied,
            egress,
        };
        debug!(
            %message_type,
            sequence_id,
            src_port = meta.src_port,
            destports = entry.destports,
            %rx_ts,
            "forwarded"
        );
        Ok((rx_ts, outcome))
    }
}

impl<S, R> TimestampedSocket<S, R> {
    /// Forward every received event message through a timestamping switch.
    ///
    /// The forwarder takes its settings from this socket's
    /// `transparent_clock` configuration and starts with fresh state.
    pub fn into_transparent_clock<F, M>(
        self,
        fabric: F,
        meta: M,
    ) -> TimestampedSocket<S, TransparentClock<F, M>>
    where
        F: SwitchFabric,
        M: SocketIo,
    {
        let tc = TransparentClock::new(fabric, meta, self.config.transparent_clock.clone());
        self.with_strategy(tc)
    }
}

impl<S, F, M> ReceiveStrategy<S> for TransparentClock<F, M>
where
    S: SocketIo + ?Sized,
    F: SwitchFabric,
    M: SocketIo,
{
    fn on_receive(
        &mut self,
        io: &S,
        frame: &mut [u8],
        _ancillary: &AncillaryTimestamps,
        _class: TimestampClass,
    ) -> Result<RxOutcome> {
        let (rx_ts, outcome) = self.forward(io, frame)?;
        self.last = Some(outcome);
        Ok(RxOutcome {
            ts: Some(rx_ts),
            forward: Some(outcome),
        })
    }
}
