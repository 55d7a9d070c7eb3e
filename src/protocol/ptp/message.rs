//! PTP header field access.
//!
//! Only the fields this layer touches are exposed: message type,
//! messageLength, correctionField and sequenceId. Everything else in a
//! message is carried through untouched, so fields are read and patched in
//! place rather than decoded into an owned message.

use byteorder::{BigEndian, ByteOrder};

/// PTP message type identifiers (IEEE 1588 Section 13.3.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PtpMessageType {
    /// Sync message (master → slave), carries T1.
    Sync = 0x00,
    /// Delay request (slave → master), sent at T3.
    DelayReq = 0x01,
    /// Peer delay request.
    PDelayReq = 0x02,
    /// Peer delay response.
    PDelayResp = 0x03,
    /// Follow-up (master → slave), carries precise T1.
    FollowUp = 0x08,
    /// Delay response (master → slave), carries T4.
    DelayResp = 0x09,
    /// Peer delay response follow-up.
    PDelayRespFollowUp = 0x0A,
    /// Announce (master → slave), clock properties.
    Announce = 0x0B,
    /// Signaling.
    Signaling = 0x0C,
    /// Management.
    Management = 0x0D,
}

impl PtpMessageType {
    /// Parse from the lower 4 bits of a byte.
    pub fn from_nibble(value: u8) -> Result<Self, PtpParseError> {
        match value & 0x0F {
            0x00 => Ok(Self::Sync),
            0x01 => Ok(Self::DelayReq),
            0x02 => Ok(Self::PDelayReq),
            0x03 => Ok(Self::PDelayResp),
            0x08 => Ok(Self::FollowUp),
            0x09 => Ok(Self::DelayResp),
            0x0A => Ok(Self::PDelayRespFollowUp),
            0x0B => Ok(Self::Announce),
            0x0C => Ok(Self::Signaling),
            0x0D => Ok(Self::Management),
            other => Err(PtpParseError::UnknownMessageType(other)),
        }
    }

    /// Whether this message type is an event message (requires timestamping).
    #[must_use]
    pub fn is_event(&self) -> bool {
        matches!(
            self,
            Self::Sync | Self::DelayReq | Self::PDelayReq | Self::PDelayResp
        )
    }
}

impl std::fmt::Display for PtpMessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync => write!(f, "Sync"),
            Self::DelayReq => write!(f, "Delay_Req"),
            Self::PDelayReq => write!(f, "Pdelay_Req"),
            Self::PDelayResp => write!(f, "Pdelay_Resp"),
            Self::FollowUp => write!(f, "Follow_Up"),
            Self::DelayResp => write!(f, "Delay_Resp"),
            Self::PDelayRespFollowUp => write!(f, "Pdelay_Resp_Follow_Up"),
            Self::Announce => write!(f, "Announce"),
            Self::Signaling => write!(f, "Signaling"),
            Self::Management => write!(f, "Management"),
        }
    }
}

/// Byte offsets of the header fields this crate touches.
mod offset {
    pub const TSMT: usize = 0;
    pub const MESSAGE_LENGTH: usize = 2;
    pub const CORRECTION: usize = 8;
    pub const SEQUENCE_ID: usize = 30;
}

/// Borrowed view over a PTP message starting at its common header.
#[derive(Debug)]
pub struct PtpHeaderView<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> PtpHeaderView<B> {
    /// Header size in bytes.
    pub const SIZE: usize = 34;

    /// Wrap a buffer, checking that it holds a full header.
    pub fn new(buf: B) -> Result<Self, PtpParseError> {
        let have = buf.as_ref().len();
        if have < Self::SIZE {
            return Err(PtpParseError::TooShort {
                needed: Self::SIZE,
                have,
            });
        }
        Ok(Self { buf })
    }

    /// Raw transportSpecific/messageType byte.
    #[must_use]
    pub fn tsmt(&self) -> u8 {
        self.buf.as_ref()[offset::TSMT]
    }

    /// Decoded message type.
    pub fn message_type(&self) -> Result<PtpMessageType, PtpParseError> {
        PtpMessageType::from_nibble(self.tsmt())
    }

    /// Declared total message length, header included.
    #[must_use]
    pub fn message_length(&self) -> u16 {
        BigEndian::read_u16(&self.buf.as_ref()[offset::MESSAGE_LENGTH..])
    }

    /// Correction field (raw 64-bit value, host order).
    #[must_use]
    pub fn correction_field(&self) -> i64 {
        BigEndian::read_i64(&self.buf.as_ref()[offset::CORRECTION..])
    }

    /// Sequence ID.
    #[must_use]
    pub fn sequence_id(&self) -> u16 {
        BigEndian::read_u16(&self.buf.as_ref()[offset::SEQUENCE_ID..])
    }

    /// Release the underlying buffer.
    pub fn into_inner(self) -> B {
        self.buf
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> PtpHeaderView<B> {
    /// Overwrite the correction field, stored big-endian on the wire.
    pub fn set_correction_field(&mut self, value: i64) {
        BigEndian::write_i64(&mut self.buf.as_mut()[offset::CORRECTION..], value);
    }

    /// Overwrite the sequence ID.
    pub fn set_sequence_id(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.buf.as_mut()[offset::SEQUENCE_ID..], value);
    }

    /// Overwrite the declared message length.
    pub fn set_message_length(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.buf.as_mut()[offset::MESSAGE_LENGTH..], value);
    }
}

/// Errors from PTP header access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PtpParseError {
    /// Packet too short.
    #[error("packet too short: need {needed} bytes, have {have}")]
    TooShort {
        /// Minimum bytes needed.
        needed: usize,
        /// Bytes actually available.
        have: usize,
    },
    /// Unknown message type.
    #[error("unknown PTP message type: 0x{0:02X}")]
    UnknownMessageType(u8),
}
