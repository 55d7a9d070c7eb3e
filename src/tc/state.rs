//! Per-port transparent-clock state.

use tracing::debug;

use crate::error::Result;
use crate::protocol::ptp::{PtpHeaderView, PtpMessageType, PtpTimestamp};

/// A Sync that went through this port, kept for `Follow_Up` correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetainedSync {
    /// Sequence ID of the Sync.
    pub sequence_id: u16,
    /// Egress timestamp captured when the Sync was forwarded.
    pub egress: Option<PtpTimestamp>,
}

/// State shared by all receives on one physical port.
///
/// Reset it whenever the port's transport is reconfigured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransparentClockState {
    master_setup: bool,
    sync: Option<RetainedSync>,
    last_egress: Option<PtpTimestamp>,
}

impl TransparentClockState {
    /// Fresh state: no master setup, nothing retained.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether a master-side setup is active.
    #[must_use]
    pub fn master_setup(&self) -> bool {
        self.master_setup
    }

    /// Mark the master-side setup active or inactive.
    pub fn set_master_setup(&mut self, active: bool) {
        self.master_setup = active;
    }

    /// The retained Sync, if any.
    #[must_use]
    pub fn retained_sync(&self) -> Option<RetainedSync> {
        self.sync
    }

    /// Retain a Sync by sequence ID, without an egress timestamp yet.
    pub fn retain_sync(&mut self, sequence_id: u16) {
        self.sync = Some(RetainedSync {
            sequence_id,
            egress: None,
        });
    }

    /// Most recently captured egress timestamp.
    #[must_use]
    pub fn last_egress(&self) -> Option<PtpTimestamp> {
        self.last_egress
    }

    /// Record the outcome of forwarding one message.
    ///
    /// The egress timestamp (or its absence) replaces the last one. A
    /// forwarded Sync also becomes the retained Sync.
    pub fn record_forward(
        &mut self,
        message_type: PtpMessageType,
        sequence_id: u16,
        egress: Option<PtpTimestamp>,
    ) {
        self.last_egress = egress;
        if message_type == PtpMessageType::Sync {
            self.sync = Some(RetainedSync {
                sequence_id,
                egress,
            });
        }
    }

    /// The correction a `Follow_Up` with `sequence_id` should carry, if any.
    #[must_use]
    pub fn correction_for(&self, sequence_id: u16) -> Option<PtpTimestamp> {
        if !self.master_setup {
            return None;
        }
        let sync = self.sync?;
        if sync.sequence_id != sequence_id {
            return None;
        }
        sync.egress
    }

    /// Write the retained Sync's egress timestamp into a matching
    /// `Follow_Up`'s correction field.
    ///
    /// `message` starts at the PTP header. Returns whether the field was
    /// written; anything other than a matching `Follow_Up` is left alone.
    ///
    /// # Errors
    /// [`SocketError::Frame`](crate::SocketError::Frame) if `message` is
    /// shorter than a PTP header.
    pub fn insert_correction(&self, message: &mut [u8]) -> Result<bool> {
        let mut header = PtpHeaderView::new(message)?;
        if header.message_type() != Ok(PtpMessageType::FollowUp) {
            return Ok(false);
        }

        let sequence_id = header.sequence_id();
        let Some(egress) = self.correction_for(sequence_id) else {
            debug!(sequence_id, "no correction for Follow_Up");
            return Ok(false);
        };

        #[allow(
            clippy::cast_possible_wrap,
            reason = "The field carries the raw nanosecond count bit for bit"
        )]
        let correction = egress.to_nanos() as i64;
        header.set_correction_field(correction);
        debug!(sequence_id, %egress, "Follow_Up corrected");
        Ok(true)
    }
}
