//! Ancillary data parsing.
//!
//! `recvmsg` hands back timestamps as control messages. Two kinds matter:
//! `SO_TIMESTAMPING`, an array of three timespecs (software, legacy hardware,
//! raw hardware), and `SO_TIMESTAMPNS`, a single software timespec.

use std::mem::size_of;

use crate::error::{Result, SocketError};
use crate::protocol::ptp::PtpTimestamp;
use crate::types::TimestampClass;

/// Size of one kernel timespec.
pub const TIMESPEC_LEN: usize = size_of::<libc::timespec>();

/// Space reserved for control messages on every receive.
pub const CONTROL_LEN: usize = 256;

const CMSG_HDR_LEN: usize = size_of::<libc::cmsghdr>();

/// Round up to the control message alignment (`CMSG_ALIGN`).
///
/// Saturates instead of overflowing for lengths within one word of
/// `usize::MAX`.
#[must_use]
pub const fn cmsg_align(len: usize) -> usize {
    len.saturating_add(size_of::<usize>() - 1) & !(size_of::<usize>() - 1)
}

/// Offset of the payload within a control message (`CMSG_DATA`).
#[must_use]
pub const fn cmsg_data_offset() -> usize {
    cmsg_align(CMSG_HDR_LEN)
}

/// Timestamps found in one control buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AncillaryTimestamps {
    /// `SO_TIMESTAMPING` triple, if present.
    pub timestamping: Option<[PtpTimestamp; 3]>,
    /// `SO_TIMESTAMPNS` software timestamp, if present.
    pub software: Option<PtpTimestamp>,
}

/// The timestamp a socket of a given class reads out of a receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelTimestamp {
    /// The kernel attached no `SO_TIMESTAMPING` record.
    None,
    /// Slot 0: software timestamp.
    Software(PtpTimestamp),
    /// Slot 1: hardware timestamp converted to system time.
    LegacyHardware(PtpTimestamp),
    /// Slot 2: raw hardware timestamp.
    Hardware(PtpTimestamp),
}

impl KernelTimestamp {
    /// The timestamp value, if any.
    #[must_use]
    pub fn timestamp(self) -> Option<PtpTimestamp> {
        match self {
            Self::None => None,
            Self::Software(ts) | Self::LegacyHardware(ts) | Self::Hardware(ts) => Some(ts),
        }
    }
}

impl AncillaryTimestamps {
    /// Pick the `SO_TIMESTAMPING` slot matching `class`.
    #[must_use]
    pub fn select(&self, class: TimestampClass) -> KernelTimestamp {
        let Some(ts) = self.timestamping else {
            return KernelTimestamp::None;
        };
        let value = ts[class.timestamping_index()];
        match class {
            TimestampClass::Software => KernelTimestamp::Software(value),
            TimestampClass::LegacyHardware => KernelTimestamp::LegacyHardware(value),
            TimestampClass::Hardware | TimestampClass::OneStep => KernelTimestamp::Hardware(value),
        }
    }
}

fn read_timespec(data: &[u8], index: usize) -> PtpTimestamp {
    let start = index * TIMESPEC_LEN;
    let bytes = &data[start..start + TIMESPEC_LEN];
    // SAFETY: bytes holds exactly one timespec worth of initialized data;
    // read_unaligned copes with the control buffer's byte alignment.
    let ts: libc::timespec = unsafe { std::ptr::read_unaligned(bytes.as_ptr().cast()) };
    PtpTimestamp::from_timespec(&ts)
}

/// Walk a control buffer and extract the timestamp records.
///
/// Later records of the same kind replace earlier ones. Records of other
/// kinds are skipped.
///
/// # Errors
/// [`SocketError::MalformedAncillary`] if a timestamp record is shorter than
/// its kind requires, or if any record claims more bytes than the buffer
/// holds.
pub fn parse_ancillary(control: &[u8]) -> Result<AncillaryTimestamps> {
    let mut out = AncillaryTimestamps::default();
    let mut offset = 0;

    while offset + CMSG_HDR_LEN <= control.len() {
        // SAFETY: at least one header's worth of bytes remain at offset.
        let hdr: libc::cmsghdr =
            unsafe { std::ptr::read_unaligned(control[offset..].as_ptr().cast()) };
        #[allow(clippy::unnecessary_cast, reason = "cmsg_len is socklen_t on musl")]
        let cmsg_len = hdr.cmsg_len as usize;
        if cmsg_len < CMSG_HDR_LEN {
            break;
        }
        let remaining = control.len() - offset;
        if cmsg_len > remaining {
            return Err(SocketError::MalformedAncillary {
                record: "cmsghdr",
                len: remaining,
                expected: cmsg_len,
            });
        }

        let end = offset + cmsg_len;
        let start = (offset + cmsg_data_offset()).min(end);
        let data = &control[start..end];

        if hdr.cmsg_level == libc::SOL_SOCKET {
            match hdr.cmsg_type {
                libc::SO_TIMESTAMPING => {
                    if data.len() < 3 * TIMESPEC_LEN {
                        return Err(SocketError::MalformedAncillary {
                            record: "SO_TIMESTAMPING",
                            len: data.len(),
                            expected: 3 * TIMESPEC_LEN,
                        });
                    }
                    out.timestamping = Some([
                        read_timespec(data, 0),
                        read_timespec(data, 1),
                        read_timespec(data, 2),
                    ]);
                }
                libc::SO_TIMESTAMPNS => {
                    if data.len() < TIMESPEC_LEN {
                        return Err(SocketError::MalformedAncillary {
                            record: "SO_TIMESTAMPNS",
                            len: data.len(),
                            expected: TIMESPEC_LEN,
                        });
                    }
                    out.software = Some(read_timespec(data, 0));
                }
                _ => {}
            }
        }

        match offset.checked_add(cmsg_align(cmsg_len)) {
            Some(next) => offset = next,
            None => break,
        }
    }

    Ok(out)
}
