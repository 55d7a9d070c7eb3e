//! The socket operations the timestamping layer needs, behind one trait.
//!
//! Everything above this module talks to a [`SocketIo`]. [`PtpSocket`] is
//! the real implementation over a file descriptor; tests substitute
//! [`MockSocket`](crate::testing::MockSocket).

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

use nix::poll::PollFlags;

use super::hwts::HwTstampConfig;
use super::sys;
use crate::types::Address;

/// What one `recvmsg` call produced besides the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecvMeta {
    /// Payload bytes written into the buffer.
    pub len: usize,
    /// Peer name, with the length the kernel reported.
    pub name: Address,
    /// Control bytes written into the control buffer.
    pub control_len: usize,
    /// `msg_flags` as returned by the kernel.
    pub flags: i32,
}

/// Socket operations used by configuration, receive and forwarding.
pub trait SocketIo {
    /// Wait for `events`; `Ok(None)` means the timeout expired.
    fn poll(&self, events: PollFlags, timeout: Duration) -> io::Result<Option<PollFlags>>;

    /// Receive payload, peer name and ancillary data in one call.
    fn recv_msg(&self, buf: &mut [u8], control: &mut [u8], error_queue: bool)
    -> io::Result<RecvMeta>;

    /// Send a frame on the connected/bound socket.
    fn send(&self, buf: &[u8]) -> io::Result<usize>;

    /// Set `SO_TIMESTAMPING`.
    fn set_timestamping(&self, flags: u32) -> io::Result<()>;

    /// Set `SO_SELECT_ERR_QUEUE`.
    fn set_select_err_queue(&self, enable: bool) -> io::Result<()>;

    /// Set `SO_TIMESTAMPNS`.
    fn set_timestamp_ns(&self, enable: bool) -> io::Result<()>;

    /// Read `IP_TOS`.
    fn tos(&self) -> io::Result<i32>;

    /// Write `IP_TOS`.
    fn set_tos(&self, tos: i32) -> io::Result<()>;

    /// Issue `SIOCSHWTSTAMP` for `device`, returning what the driver granted.
    fn set_hwtstamp(&self, device: &str, config: HwTstampConfig) -> io::Result<HwTstampConfig>;
}

/// A socket file descriptor used for PTP traffic.
#[derive(Debug)]
pub struct PtpSocket {
    fd: OwnedFd,
}

impl PtpSocket {
    /// Open a socket of the given domain, type and protocol.
    ///
    /// # Errors
    /// Returns the OS error if `socket(2)` fails.
    pub fn open(domain: libc::c_int, ty: libc::c_int, protocol: libc::c_int) -> io::Result<Self> {
        // SAFETY: socket(2) has no memory-safety preconditions.
        let fd = unsafe { libc::socket(domain, ty | libc::SOCK_CLOEXEC, protocol) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: fd was just returned by socket(2) and is owned by nobody else.
        Ok(Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }

    /// A UDP/IPv4 datagram socket.
    ///
    /// # Errors
    /// Returns the OS error if `socket(2)` fails.
    pub fn udp_v4() -> io::Result<Self> {
        Self::open(libc::AF_INET, libc::SOCK_DGRAM, libc::IPPROTO_UDP)
    }

    /// A UDP/IPv6 datagram socket.
    ///
    /// # Errors
    /// Returns the OS error if `socket(2)` fails.
    pub fn udp_v6() -> io::Result<Self> {
        Self::open(libc::AF_INET6, libc::SOCK_DGRAM, libc::IPPROTO_UDP)
    }

    /// A raw packet socket for the given ethertype (needs `CAP_NET_RAW`).
    ///
    /// # Errors
    /// Returns the OS error if `socket(2)` fails.
    pub fn packet(ethertype: u16) -> io::Result<Self> {
        Self::open(
            libc::AF_PACKET,
            libc::SOCK_RAW,
            libc::c_int::from(ethertype.to_be()),
        )
    }

    /// Wrap an existing descriptor.
    #[must_use]
    pub fn from_fd(fd: OwnedFd) -> Self {
        Self { fd }
    }

    /// Release the descriptor.
    #[must_use]
    pub fn into_fd(self) -> OwnedFd {
        self.fd
    }

    /// Switch `O_NONBLOCK` on or off.
    ///
    /// # Errors
    /// Returns the OS error if `fcntl(2)` fails.
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        let fd = self.fd.as_raw_fd();
        // SAFETY: fd is a valid descriptor owned by self.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        let flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };
        // SAFETY: as above.
        if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn set_int_opt(&self, level: libc::c_int, name: libc::c_int, value: libc::c_int) -> io::Result<()> {
        // SAFETY:
        // - the descriptor is owned by self and valid for the call
        // - &value points to a c_int on the stack and option_len is its size
        let ret = unsafe {
            libc::setsockopt(
                self.fd.as_raw_fd(),
                level,
                name,
                std::ptr::from_ref(&value).cast(),
                socklen_of::<libc::c_int>(),
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn int_opt(&self, level: libc::c_int, name: libc::c_int) -> io::Result<libc::c_int> {
        let mut value: libc::c_int = 0;
        let mut len = socklen_of::<libc::c_int>();
        // SAFETY:
        // - the descriptor is owned by self and valid for the call
        // - &mut value is a properly sized buffer and len holds its size
        let ret = unsafe {
            libc::getsockopt(
                self.fd.as_raw_fd(),
                level,
                name,
                std::ptr::from_mut(&mut value).cast(),
                &mut len,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(value)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Socket option and address sizes are tiny"
)]
fn socklen_of<T>() -> libc::socklen_t {
    std::mem::size_of::<T>() as libc::socklen_t
}

/// Convert a poll timeout to milliseconds, rounding sub-millisecond waits up.
fn timeout_ms(timeout: Duration) -> libc::c_int {
    let ms = timeout.as_millis();
    if ms == 0 && !timeout.is_zero() {
        return 1;
    }
    libc::c_int::try_from(ms).unwrap_or(libc::c_int::MAX)
}

impl SocketIo for PtpSocket {
    fn poll(&self, events: PollFlags, timeout: Duration) -> io::Result<Option<PollFlags>> {
        let mut pfd = libc::pollfd {
            fd: self.fd.as_raw_fd(),
            events: events.bits(),
            revents: 0,
        };
        // SAFETY: pfd is a single valid pollfd and nfds is 1.
        let res = unsafe { libc::poll(&mut pfd, 1, timeout_ms(timeout)) };
        match res {
            r if r < 0 => Err(io::Error::last_os_error()),
            0 => Ok(None),
            _ => Ok(Some(PollFlags::from_bits_truncate(pfd.revents))),
        }
    }

    fn recv_msg(
        &self,
        buf: &mut [u8],
        control: &mut [u8],
        error_queue: bool,
    ) -> io::Result<RecvMeta> {
        // SAFETY: sockaddr_storage is plain old data; all-zero is valid.
        let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
        let mut iov = libc::iovec {
            iov_base: buf.as_mut_ptr().cast(),
            iov_len: buf.len(),
        };
        // SAFETY: msghdr is plain old data; all-zero is valid.
        let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
        msg.msg_name = std::ptr::from_mut(&mut storage).cast();
        msg.msg_namelen = socklen_of::<libc::sockaddr_storage>();
        msg.msg_iov = &mut iov;
        msg.msg_iovlen = 1;
        msg.msg_control = control.as_mut_ptr().cast();
        msg.msg_controllen = control.len() as _;

        let flags = if error_queue { libc::MSG_ERRQUEUE } else { 0 };
        // SAFETY:
        // - the descriptor is owned by self and valid for the call
        // - msg points at storage, iov and control, which all outlive the call
        //   and whose lengths are recorded in msg
        let cnt = unsafe { libc::recvmsg(self.fd.as_raw_fd(), &mut msg, flags) };
        if cnt < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(RecvMeta {
            len: usize::try_from(cnt).unwrap_or(0),
            name: Address::from_raw(&storage, msg.msg_namelen as usize),
            control_len: (msg.msg_controllen as usize).min(control.len()),
            flags: msg.msg_flags,
        })
    }

    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        // SAFETY: buf is a valid slice for the duration of the call.
        let cnt = unsafe { libc::send(self.fd.as_raw_fd(), buf.as_ptr().cast(), buf.len(), 0) };
        if cnt < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(usize::try_from(cnt).unwrap_or(0))
    }

    #[allow(
        clippy::cast_possible_wrap,
        reason = "SOF_TIMESTAMPING flags occupy the low bits only"
    )]
    fn set_timestamping(&self, flags: u32) -> io::Result<()> {
        self.set_int_opt(libc::SOL_SOCKET, libc::SO_TIMESTAMPING, flags as libc::c_int)
    }

    fn set_select_err_queue(&self, enable: bool) -> io::Result<()> {
        self.set_int_opt(
            libc::SOL_SOCKET,
            sys::SO_SELECT_ERR_QUEUE,
            libc::c_int::from(enable),
        )
    }

    fn set_timestamp_ns(&self, enable: bool) -> io::Result<()> {
        self.set_int_opt(
            libc::SOL_SOCKET,
            libc::SO_TIMESTAMPNS,
            libc::c_int::from(enable),
        )
    }

    fn tos(&self) -> io::Result<i32> {
        self.int_opt(libc::SOL_IP, libc::IP_TOS)
    }

    fn set_tos(&self, tos: i32) -> io::Result<()> {
        self.set_int_opt(libc::SOL_IP, libc::IP_TOS, tos)
    }

    fn set_hwtstamp(&self, device: &str, config: HwTstampConfig) -> io::Result<HwTstampConfig> {
        let mut granted = config;
        sys::set_hwtstamp(self.fd.as_raw_fd(), device, &mut granted)?;
        Ok(granted)
    }
}

impl AsRawFd for PtpSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsFd for PtpSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl From<OwnedFd> for PtpSocket {
    fn from(fd: OwnedFd) -> Self {
        Self::from_fd(fd)
    }
}

impl From<std::net::UdpSocket> for PtpSocket {
    fn from(socket: std::net::UdpSocket) -> Self {
        Self::from_fd(socket.into())
    }
}
