use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use serde::{Deserialize, Serialize};

/// Length of an Ethernet MAC address.
pub const MAC_LEN: usize = 6;

/// A 48-bit IEEE 802 MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; MAC_LEN]);

impl MacAddr {
    /// PTP end-to-end multicast group (IEEE 1588 Annex F).
    pub const PTP_E2E_MULTICAST: Self = Self([0x01, 0x1B, 0x19, 0x00, 0x00, 0x00]);

    /// PTP peer-delay multicast group (IEEE 1588 Annex F).
    pub const PTP_P2P_MULTICAST: Self = Self([0x01, 0x80, 0xC2, 0x00, 0x00, 0x0E]);

    /// Raw octets.
    #[must_use]
    pub fn octets(&self) -> [u8; MAC_LEN] {
        self.0
    }

    /// Whether the group bit is set.
    #[must_use]
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl From<[u8; MAC_LEN]> for MacAddr {
    fn from(octets: [u8; MAC_LEN]) -> Self {
        Self(octets)
    }
}

/// Link-layer socket address (`AF_PACKET`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinkAddr {
    /// Interface index, 0 when unknown.
    pub ifindex: i32,
    /// Ethertype in host order.
    pub protocol: u16,
    /// Hardware address.
    pub mac: MacAddr,
}

/// Address family selector for interface address lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4.
    Inet,
    /// IPv6.
    Inet6,
    /// Link layer.
    Packet,
}

impl AddressFamily {
    /// The matching `AF_*` constant.
    #[must_use]
    pub fn as_raw(self) -> libc::c_int {
        match self {
            Self::Inet => libc::AF_INET,
            Self::Inet6 => libc::AF_INET6,
            Self::Packet => libc::AF_PACKET,
        }
    }
}

/// The socket address variants a PTP transport can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SockAddr {
    /// Nothing stored (yet), or a family this crate does not decode.
    #[default]
    Unspecified,
    /// UDP over IPv4.
    V4(SocketAddrV4),
    /// UDP over IPv6.
    V6(SocketAddrV6),
    /// Raw IEEE 802.3.
    Link(LinkAddr),
}

/// Caller-owned address buffer, filled in place by receive and query calls.
///
/// `len` is the socket-address length the kernel reported, which is what
/// callers compare against to tell whether a name was returned at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address {
    /// Decoded address.
    pub addr: SockAddr,
    /// Length of the raw socket address.
    pub len: usize,
}

impl Address {
    /// An empty address buffer.
    #[must_use]
    pub fn unspecified() -> Self {
        Self::default()
    }

    /// The family of the stored address, if any.
    #[must_use]
    pub fn family(&self) -> Option<AddressFamily> {
        match self.addr {
            SockAddr::Unspecified => None,
            SockAddr::V4(_) => Some(AddressFamily::Inet),
            SockAddr::V6(_) => Some(AddressFamily::Inet6),
            SockAddr::Link(_) => Some(AddressFamily::Packet),
        }
    }

    /// The IP socket address, for UDP transports.
    #[must_use]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self.addr {
            SockAddr::V4(a) => Some(SocketAddr::V4(a)),
            SockAddr::V6(a) => Some(SocketAddr::V6(a)),
            _ => None,
        }
    }

    /// The hardware address, for link-layer addresses.
    #[must_use]
    pub fn mac(&self) -> Option<MacAddr> {
        match self.addr {
            SockAddr::Link(l) => Some(l.mac),
            _ => None,
        }
    }

    /// Build from an IP socket address with its kernel length.
    #[must_use]
    pub fn from_socket_addr(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(a) => Self {
                addr: SockAddr::V4(a),
                len: std::mem::size_of::<libc::sockaddr_in>(),
            },
            SocketAddr::V6(a) => Self {
                addr: SockAddr::V6(a),
                len: std::mem::size_of::<libc::sockaddr_in6>(),
            },
        }
    }

    /// Build a link-layer address with its kernel length.
    #[must_use]
    pub fn from_link(link: LinkAddr) -> Self {
        Self {
            addr: SockAddr::Link(link),
            len: std::mem::size_of::<libc::sockaddr_ll>(),
        }
    }

    /// Decode a raw socket address as returned by `recvmsg`.
    ///
    /// `len` is kept verbatim even when the family is not one this crate
    /// understands.
    #[must_use]
    pub fn from_raw(storage: &libc::sockaddr_storage, len: usize) -> Self {
        let family = libc::c_int::from(storage.ss_family);
        let addr = if len == 0 {
            SockAddr::Unspecified
        } else if family == libc::AF_INET && len >= std::mem::size_of::<libc::sockaddr_in>() {
            // SAFETY: sockaddr_storage is large enough and suitably aligned
            // for every sockaddr type, and the family says this is one.
            let sin = unsafe { &*std::ptr::from_ref(storage).cast::<libc::sockaddr_in>() };
            SockAddr::V4(SocketAddrV4::new(
                Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)),
                u16::from_be(sin.sin_port),
            ))
        } else if family == libc::AF_INET6 && len >= std::mem::size_of::<libc::sockaddr_in6>() {
            // SAFETY: as above.
            let sin6 = unsafe { &*std::ptr::from_ref(storage).cast::<libc::sockaddr_in6>() };
            SockAddr::V6(SocketAddrV6::new(
                Ipv6Addr::from(sin6.sin6_addr.s6_addr),
                u16::from_be(sin6.sin6_port),
                sin6.sin6_flowinfo,
                sin6.sin6_scope_id,
            ))
        } else if family == libc::AF_PACKET {
            // SAFETY: as above.
            let sll = unsafe { &*std::ptr::from_ref(storage).cast::<libc::sockaddr_ll>() };
            let mut mac = [0u8; MAC_LEN];
            let halen = usize::from(sll.sll_halen).min(MAC_LEN);
            mac[..halen].copy_from_slice(&sll.sll_addr[..halen]);
            SockAddr::Link(LinkAddr {
                ifindex: sll.sll_ifindex,
                protocol: u16::from_be(sll.sll_protocol),
                mac: MacAddr(mac),
            })
        } else {
            SockAddr::Unspecified
        };
        Self { addr, len }
    }

    /// Encode into a raw socket address for `sendto`-style calls.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "AF_* constants and MAC_LEN fit their narrower C fields"
    )]
    pub fn to_raw(&self) -> (libc::sockaddr_storage, usize) {
        // SAFETY: sockaddr_storage is plain old data; all-zero is valid.
        let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
        let base = std::ptr::from_mut(&mut storage);
        let len = match self.addr {
            SockAddr::Unspecified => 0,
            SockAddr::V4(a) => {
                // SAFETY: storage is large enough and aligned for sockaddr_in.
                let sin = unsafe { &mut *base.cast::<libc::sockaddr_in>() };
                sin.sin_family = libc::AF_INET as libc::sa_family_t;
                sin.sin_port = a.port().to_be();
                sin.sin_addr.s_addr = u32::from(*a.ip()).to_be();
                std::mem::size_of::<libc::sockaddr_in>()
            }
            SockAddr::V6(a) => {
                // SAFETY: storage is large enough and aligned for sockaddr_in6.
                let sin6 = unsafe { &mut *base.cast::<libc::sockaddr_in6>() };
                sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
                sin6.sin6_port = a.port().to_be();
                sin6.sin6_addr.s6_addr = a.ip().octets();
                sin6.sin6_flowinfo = a.flowinfo();
                sin6.sin6_scope_id = a.scope_id();
                std::mem::size_of::<libc::sockaddr_in6>()
            }
            SockAddr::Link(l) => {
                // SAFETY: storage is large enough and aligned for sockaddr_ll.
                let sll = unsafe { &mut *base.cast::<libc::sockaddr_ll>() };
                sll.sll_family = libc::AF_PACKET as libc::c_ushort;
                sll.sll_protocol = l.protocol.to_be();
                sll.sll_ifindex = l.ifindex;
                sll.sll_halen = MAC_LEN as u8;
                sll.sll_addr[..MAC_LEN].copy_from_slice(&l.mac.0);
                std::mem::size_of::<libc::sockaddr_ll>()
            }
        };
        (storage, len)
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Self::from_socket_addr(addr)
    }
}
