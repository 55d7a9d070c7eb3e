//! DSCP marking of outgoing PTP packets.

use tracing::debug;

use super::socket::SocketIo;
use crate::error::{Result, SocketError};

const DSCP_MASK: i32 = 0xFC;

/// Mark outgoing packets with a DSCP codepoint.
///
/// Only the six DSCP bits of the TOS byte change; the ECN bits and anything
/// else already set are preserved. An unreadable TOS counts as zero.
///
/// # Errors
/// [`SocketError::SocketOption`] if the new TOS cannot be written.
pub fn set_priority<S: SocketIo + ?Sized>(io: &S, dscp: u8) -> Result<()> {
    let mut tos = io.tos().unwrap_or_else(|e| {
        debug!("IP_TOS unreadable, assuming 0: {}", e);
        0
    });

    // clear old DSCP value
    tos &= !DSCP_MASK;

    // set new DSCP value
    tos |= i32::from(dscp & 0x3F) << 2;

    io.set_tos(tos)
        .map_err(|source| SocketError::SocketOption {
            option: "IP_TOS",
            source,
        })
}
