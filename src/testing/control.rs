//! Control message buffers as the kernel lays them out

use crate::net::cmsg::{TIMESPEC_LEN, cmsg_align, cmsg_data_offset};
use crate::protocol::ptp::PtpTimestamp;

/// Builds `recvmsg` control buffers record by record.
#[derive(Debug, Clone, Default)]
pub struct ControlBuilder {
    buf: Vec<u8>,
}

fn timespec_bytes(ts: PtpTimestamp) -> [u8; TIMESPEC_LEN] {
    let spec = ts.to_timespec();
    let mut out = [0u8; TIMESPEC_LEN];
    // SAFETY: spec is a fully initialized timespec of exactly TIMESPEC_LEN
    // bytes and out does not overlap it.
    unsafe {
        std::ptr::copy_nonoverlapping(
            std::ptr::from_ref(&spec).cast::<u8>(),
            out.as_mut_ptr(),
            TIMESPEC_LEN,
        );
    }
    out
}

impl ControlBuilder {
    /// An empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arbitrary record.
    #[must_use]
    pub fn raw(mut self, level: libc::c_int, ty: libc::c_int, data: &[u8]) -> Self {
        let len = cmsg_data_offset() + data.len();
        // SAFETY: cmsghdr is plain old data; all-zero is valid.
        let mut hdr: libc::cmsghdr = unsafe { std::mem::zeroed() };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Test records are far below socklen_t limits"
        )]
        let cmsg_len = len as _;
        hdr.cmsg_len = cmsg_len;
        hdr.cmsg_level = level;
        hdr.cmsg_type = ty;

        let start = self.buf.len();
        self.buf.resize(start + cmsg_align(len), 0);
        // SAFETY: the buffer was just grown by at least one header's worth
        // of bytes at start; write_unaligned has no alignment requirement.
        unsafe {
            std::ptr::write_unaligned(self.buf[start..].as_mut_ptr().cast(), hdr);
        }
        self.buf[start + cmsg_data_offset()..start + len].copy_from_slice(data);
        self
    }

    /// Append an `SO_TIMESTAMPING` record: software, legacy, raw hardware.
    #[must_use]
    pub fn timestamping(self, ts: [PtpTimestamp; 3]) -> Self {
        let mut data = Vec::with_capacity(3 * TIMESPEC_LEN);
        for t in ts {
            data.extend_from_slice(&timespec_bytes(t));
        }
        self.raw(libc::SOL_SOCKET, libc::SO_TIMESTAMPING, &data)
    }

    /// Append an `SO_TIMESTAMPNS` record.
    #[must_use]
    pub fn timestamp_ns(self, ts: PtpTimestamp) -> Self {
        self.raw(libc::SOL_SOCKET, libc::SO_TIMESTAMPNS, &timespec_bytes(ts))
    }

    /// The finished buffer.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
