//! Switch fabric management channel.

use std::io;

use crate::protocol::ptp::PtpTimestamp;
use crate::types::MacAddr;

/// A management route: where the switch sends the next frame the host
/// injects, and whether it captures the egress timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchManagementEntry {
    /// Bit mask of destination ports.
    pub destports: u8,
    /// Destination MAC the route matches.
    pub macaddr: MacAddr,
    /// Egress timestamp register to capture into.
    pub ts_regid: u8,
    /// Capture the egress timestamp.
    pub egr_ts: bool,
}

impl SwitchManagementEntry {
    /// Route a frame that came in on `src_port` to every other front port.
    ///
    /// The host port and the ingress port are both excluded.
    #[must_use]
    pub fn for_ingress(port_mask: u8, host_port: u8, src_port: u8, ts_regid: u8) -> Self {
        Self {
            destports: port_mask & !port_bit(host_port) & !port_bit(src_port),
            macaddr: MacAddr::PTP_E2E_MULTICAST,
            ts_regid,
            egr_ts: true,
        }
    }

    /// Port whose egress timestamp register is read after forwarding.
    #[must_use]
    pub fn egress_port(&self) -> u8 {
        if self.destports & 0x1 != 0 { 0 } else { 1 }
    }
}

fn port_bit(port: u8) -> u8 {
    1u8.checked_shl(u32::from(port)).unwrap_or(0)
}

/// Access to a timestamping switch over its management interface.
pub trait SwitchFabric {
    /// Read the switch's free-running PTP clock.
    ///
    /// # Errors
    /// Returns the transport error of the management interface.
    fn clock_time(&mut self) -> io::Result<PtpTimestamp>;

    /// Install `entry` in management route slot `index`.
    ///
    /// # Errors
    /// Returns the transport error of the management interface.
    fn set_mgmt_route(&mut self, entry: &SwitchManagementEntry, index: u8) -> io::Result<()>;

    /// Read the egress timestamp captured on `port` into register `ts_regid`.
    ///
    /// Gives up after `attempts` reads; `Ok(None)` means nothing was
    /// captured in time.
    ///
    /// # Errors
    /// Returns the transport error of the management interface.
    fn poll_egress_timestamp(
        &mut self,
        port: u8,
        ts_regid: u8,
        attempts: u32,
    ) -> io::Result<Option<PtpTimestamp>>;
}

impl<T: SwitchFabric + ?Sized> SwitchFabric for Box<T> {
    fn clock_time(&mut self) -> io::Result<PtpTimestamp> {
        (**self).clock_time()
    }

    fn set_mgmt_route(&mut self, entry: &SwitchManagementEntry, index: u8) -> io::Result<()> {
        (**self).set_mgmt_route(entry, index)
    }

    fn poll_egress_timestamp(
        &mut self,
        port: u8,
        ts_regid: u8,
        attempts: u32,
    ) -> io::Result<Option<PtpTimestamp>> {
        (**self).poll_egress_timestamp(port, ts_regid, attempts)
    }
}
