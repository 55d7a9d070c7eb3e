//! Meta-data frames.
//!
//! For every event message trapped to the host port the switch emits a
//! follow-up frame on a separate channel. Its payload, after a plain
//! Ethernet header, carries the low 24 bits of the switch's receive
//! timestamp and the port the message came in on.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, SocketError};
use crate::protocol::ptp::PtpTimestamp;

/// Ethernet header length.
pub const ETH_HLEN: usize = 14;

/// Mask of the timestamp bits a meta-data frame carries.
pub const META_TS_MASK: u64 = 0x00FF_FFFF;

/// Highest switch port number a source port may name.
pub const MAX_PORT: u8 = 7;

/// Payload of a meta-data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetaDataFrame {
    /// Receive timestamp, bits 23..16 (in ticks).
    pub rx_ts_byte2: u8,
    /// Receive timestamp, bits 15..8.
    pub rx_ts_byte1: u8,
    /// Receive timestamp, bits 7..0.
    pub rx_ts_byte0: u8,
    /// Byte 4 of the original destination MAC.
    pub dmac_byte4: u8,
    /// Byte 3 of the original destination MAC.
    pub dmac_byte3: u8,
    /// Switch port the event message arrived on.
    pub src_port: u8,
}

impl MetaDataFrame {
    /// Payload size in bytes.
    pub const SIZE: usize = 8;

    /// Full frame size, Ethernet header included.
    pub const FRAME_LEN: usize = ETH_HLEN + Self::SIZE;

    /// Decode a payload (without the Ethernet header).
    ///
    /// # Errors
    /// [`SocketError::MetaFrame`] if the payload is short or names a port
    /// that does not exist.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::SIZE {
            return Err(SocketError::MetaFrame {
                reason: format!("short payload: {} bytes", payload.len()),
            });
        }
        let rx_ts = BigEndian::read_u32(&payload[0..4]);
        let src_port = BigEndian::read_u16(&payload[6..8]);
        let src_port = u8::try_from(src_port)
            .ok()
            .filter(|p| *p <= MAX_PORT)
            .ok_or_else(|| SocketError::MetaFrame {
                reason: format!("source port {src_port} out of range"),
            })?;

        let [_, rx_ts_byte2, rx_ts_byte1, rx_ts_byte0] = rx_ts.to_be_bytes();
        Ok(Self {
            rx_ts_byte2,
            rx_ts_byte1,
            rx_ts_byte0,
            dmac_byte4: payload[4],
            dmac_byte3: payload[5],
            src_port,
        })
    }

    /// Decode a whole frame, skipping its Ethernet header.
    ///
    /// # Errors
    /// As [`MetaDataFrame::decode`].
    pub fn from_frame(frame: &[u8]) -> Result<Self> {
        if frame.len() < Self::FRAME_LEN {
            return Err(SocketError::MetaFrame {
                reason: format!("short read: {} bytes", frame.len()),
            });
        }
        Self::decode(&frame[ETH_HLEN..])
    }

    /// Encode the payload.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[1] = self.rx_ts_byte2;
        out[2] = self.rx_ts_byte1;
        out[3] = self.rx_ts_byte0;
        out[4] = self.dmac_byte4;
        out[5] = self.dmac_byte3;
        BigEndian::write_u16(&mut out[6..8], u16::from(self.src_port));
        out
    }

    /// The 24 timestamp bits, as a tick count.
    #[must_use]
    pub fn rx_ts_low(&self) -> u32 {
        u32::from(self.rx_ts_byte2) << 16
            | u32::from(self.rx_ts_byte1) << 8
            | u32::from(self.rx_ts_byte0)
    }
}

/// Splice the low tick bits from a meta-data frame into a coarse clock
/// reading.
///
/// The result has the coarse reading's tick bits above bit 23 and exactly
/// `low_ticks` below. No wrap compensation is applied: if the counter's low
/// bits rolled over between reception and the clock read, the result is
/// one 2^24-tick period early.
///
/// # Panics
/// Panics if `tick_ns` is zero.
#[must_use]
pub fn reconstruct_rx_timestamp(coarse: PtpTimestamp, low_ticks: u32, tick_ns: u64) -> PtpTimestamp {
    let ticks = coarse.to_ticks(tick_ns);
    let ticks = (ticks & !META_TS_MASK) | (u64::from(low_ticks) & META_TS_MASK);
    PtpTimestamp::from_ticks(ticks, tick_ns)
}
