mod control;
mod mock_socket;
mod mock_switch;

pub use control::ControlBuilder;
pub use mock_socket::{MockOption, MockPacket, MockSocket};
pub use mock_switch::MockSwitch;

use crate::protocol::ptp::PtpTimestamp;
use crate::tc::{ETH_HLEN, MetaDataFrame};

/// Build a PTP-over-Ethernet frame: a zeroed Ethernet header followed by a
/// 44-byte message of `message_type` carrying `sequence_id`.
#[must_use]
pub fn ptp_frame(message_type: u8, sequence_id: u16) -> Vec<u8> {
    const MESSAGE_LEN: u16 = 44;
    let mut frame = vec![0u8; ETH_HLEN + usize::from(MESSAGE_LEN)];
    frame[12..14].copy_from_slice(&crate::protocol::ptp::PTP_ETHERTYPE.to_be_bytes());
    let msg = &mut frame[ETH_HLEN..];
    msg[0] = message_type & 0x0F;
    msg[1] = 0x02;
    msg[2..4].copy_from_slice(&MESSAGE_LEN.to_be_bytes());
    msg[30..32].copy_from_slice(&sequence_id.to_be_bytes());
    frame
}

/// Build a whole meta-data frame for a reception on `src_port` whose low
/// timestamp ticks are `low_ticks`.
#[must_use]
pub fn meta_frame(src_port: u8, low_ticks: u32) -> Vec<u8> {
    let [_, b2, b1, b0] = low_ticks.to_be_bytes();
    let meta = MetaDataFrame {
        rx_ts_byte2: b2,
        rx_ts_byte1: b1,
        rx_ts_byte0: b0,
        dmac_byte4: 0,
        dmac_byte3: 0,
        src_port,
    };
    let mut frame = vec![0u8; ETH_HLEN];
    frame.extend_from_slice(&meta.encode());
    frame
}

/// Shorthand for a timestamp.
#[must_use]
pub fn ts(seconds: u64, nanoseconds: u32) -> PtpTimestamp {
    PtpTimestamp::new(seconds, nanoseconds)
}
