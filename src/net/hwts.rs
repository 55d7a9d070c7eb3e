//! Hardware timestamp negotiation with the network driver.

use tracing::warn;

use super::socket::SocketIo;
use crate::error::{Result, SocketError};

/// `HWTSTAMP_TX_*` transmit modes.
pub mod tx_type {
    /// No outgoing packet will need hardware timestamping.
    pub const OFF: i32 = 0;
    /// Report hardware transmit timestamps on the error queue.
    pub const ON: i32 = 1;
    /// Insert Sync origin timestamps in hardware; other packets as `ON`.
    pub const ONESTEP_SYNC: i32 = 2;
}

/// `HWTSTAMP_FILTER_*` receive filters.
pub mod rx_filter {
    /// Time stamp no incoming packet at all.
    pub const NONE: i32 = 0;
    /// Time stamp any incoming packet.
    pub const ALL: i32 = 1;
    /// Return value: time stamp all packets requested plus some others.
    pub const SOME: i32 = 2;
    /// PTP v2, UDP, any kind of event packet.
    pub const PTP_V2_L4_EVENT: i32 = 6;
    /// 802.AS1, Ethernet, any kind of event packet.
    pub const PTP_V2_L2_EVENT: i32 = 9;
    /// PTP v2/802.AS1, any layer, any kind of event packet.
    pub const PTP_V2_EVENT: i32 = 12;
}

/// `struct hwtstamp_config`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HwTstampConfig {
    /// Reserved, must be zero.
    pub flags: i32,
    /// One of [`tx_type`].
    pub tx_type: i32,
    /// One of [`rx_filter`].
    pub rx_filter: i32,
}

impl HwTstampConfig {
    /// A request for the given receive filter, one-step or two-step.
    #[must_use]
    pub fn request(filter: i32, one_step: bool) -> Self {
        Self {
            flags: 0,
            tx_type: if one_step {
                tx_type::ONESTEP_SYNC
            } else {
                tx_type::ON
            },
            rx_filter: filter,
        }
    }
}

/// Ask the driver of `device` to timestamp with `filter`, and check what it
/// actually granted.
///
/// A different transmit mode is a failure. A different receive filter is
/// tolerated only when it is `ALL` or `PTP_V2_EVENT`, both of which cover
/// every PTP event message.
///
/// # Errors
/// [`SocketError::DeviceRejected`] if the ioctl fails,
/// [`SocketError::TxTypeChanged`] or [`SocketError::RxFilterRejected`] if the
/// granted configuration is unusable.
pub fn hwts_init<S: SocketIo + ?Sized>(
    io: &S,
    device: &str,
    filter: i32,
    one_step: bool,
) -> Result<HwTstampConfig> {
    let req = HwTstampConfig::request(filter, one_step);
    let cfg = io
        .set_hwtstamp(device, req)
        .map_err(|source| SocketError::DeviceRejected {
            device: device.to_string(),
            source,
        })?;

    if cfg != req {
        warn!(device, "driver changed our HWTSTAMP options");
        warn!(device, "tx_type   {} not {}", cfg.tx_type, req.tx_type);
        warn!(device, "rx_filter {} not {}", cfg.rx_filter, req.rx_filter);

        if cfg.tx_type != req.tx_type {
            return Err(SocketError::TxTypeChanged {
                device: device.to_string(),
                requested: req.tx_type,
                granted: cfg.tx_type,
            });
        }
        if cfg.rx_filter != rx_filter::ALL && cfg.rx_filter != rx_filter::PTP_V2_EVENT {
            return Err(SocketError::RxFilterRejected {
                device: device.to_string(),
                requested: req.rx_filter,
                granted: cfg.rx_filter,
            });
        }
    }

    Ok(cfg)
}
