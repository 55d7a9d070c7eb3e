//! Interface queries: index, hardware address, IP address and the driver's
//! timestamping capabilities.

use std::io;
use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};
use std::os::fd::AsRawFd;

use nix::ifaddrs::getifaddrs;
use tracing::{debug, error, warn};

use super::socket::PtpSocket;
use super::sys::{self, ETHTOOL_GET_TS_INFO, EthtoolTsInfo, Ifreq};
use crate::error::{Result, SocketError};
use crate::types::{Address, AddressFamily, MAC_LEN, MacAddr, TimestampCapabilities};

/// Open a throwaway UDP/IPv4 socket for interface ioctls.
///
/// # Errors
/// [`SocketError::Resource`] if the socket cannot be created.
pub fn control_socket() -> Result<PtpSocket> {
    PtpSocket::udp_v4().map_err(|source| {
        error!("socket failed: {}", source);
        SocketError::Resource {
            op: "socket",
            source,
        }
    })
}

/// Kernel index of interface `name`, queried through `fd`.
///
/// # Errors
/// [`SocketError::InvalidInterfaceName`] or [`SocketError::InterfaceQuery`].
pub fn interface_index(fd: &impl AsRawFd, name: &str) -> Result<i32> {
    let mut ifreq = Ifreq::new(name)?;
    // SAFETY: ifreq is a valid, NUL-terminated request; SIOCGIFINDEX only
    // writes the ifindex member of the union.
    unsafe { sys::siocgifindex(fd.as_raw_fd(), &mut ifreq) }.map_err(|errno| {
        error!(device = name, "ioctl SIOCGIFINDEX failed: {}", errno);
        SocketError::InterfaceQuery {
            request: "SIOCGIFINDEX",
            device: name.to_string(),
            source: io::Error::from(errno),
        }
    })?;
    // SAFETY: the kernel filled in the ifindex member.
    Ok(unsafe { ifreq.ifr_ifru.ifindex })
}

/// Hardware address of interface `name`.
///
/// # Errors
/// [`SocketError::Resource`] if no control socket can be opened,
/// [`SocketError::InterfaceQuery`] if the ioctl fails.
pub fn interface_mac(name: &str) -> Result<MacAddr> {
    let mut ifreq = Ifreq::new(name)?;
    let sock = control_socket()?;
    // SAFETY: ifreq is a valid request; SIOCGIFHWADDR writes a sockaddr into
    // the hwaddr member.
    unsafe { sys::siocgifhwaddr(sock.as_raw_fd(), &mut ifreq) }.map_err(|errno| {
        error!(device = name, "ioctl SIOCGIFHWADDR failed: {}", errno);
        SocketError::InterfaceQuery {
            request: "SIOCGIFHWADDR",
            device: name.to_string(),
            source: io::Error::from(errno),
        }
    })?;

    // SAFETY: the kernel filled in the hwaddr member.
    let hwaddr = unsafe { ifreq.ifr_ifru.hwaddr };
    let mut mac = [0u8; MAC_LEN];
    for (to, from) in mac.iter_mut().zip(hwaddr.sa_data.iter()) {
        *to = u8::from_ne_bytes(from.to_ne_bytes());
    }
    Ok(MacAddr(mac))
}

/// First address of `family` configured on interface `name`.
///
/// Only IP families are looked up; a link-layer request always ends in
/// [`SocketError::AddressNotFound`].
///
/// # Errors
/// [`SocketError::Resource`] if `getifaddrs` fails,
/// [`SocketError::AddressNotFound`] if no address matches.
pub fn interface_addr(name: &str, family: AddressFamily) -> Result<Address> {
    let addrs = getifaddrs().map_err(|errno| {
        warn!("getifaddrs failed: {}", errno);
        SocketError::Resource {
            op: "getifaddrs",
            source: io::Error::from(errno),
        }
    })?;

    for ifa in addrs {
        if ifa.interface_name != name {
            continue;
        }
        let Some(storage) = ifa.address else {
            continue;
        };
        let found = match family {
            AddressFamily::Inet => storage
                .as_sockaddr_in()
                .map(|sin| SocketAddr::V4(SocketAddrV4::from(*sin))),
            AddressFamily::Inet6 => storage
                .as_sockaddr_in6()
                .map(|sin6| SocketAddr::V6(SocketAddrV6::from(*sin6))),
            AddressFamily::Packet => None,
        };
        if let Some(addr) = found {
            debug!(device = name, %addr, "interface address");
            return Ok(Address::from_socket_addr(addr));
        }
    }

    Err(SocketError::AddressNotFound {
        device: name.to_string(),
        family,
    })
}

fn query_ts_info(name: &str) -> Result<EthtoolTsInfo> {
    let mut ifreq = Ifreq::new(name)?;
    let mut info = EthtoolTsInfo {
        cmd: ETHTOOL_GET_TS_INFO,
        ..EthtoolTsInfo::default()
    };
    ifreq.ifr_ifru.data = std::ptr::from_mut(&mut info).cast();

    let sock = control_socket()?;
    // SAFETY: ifreq is a valid request whose data pointer refers to `info`,
    // which outlives the call.
    unsafe { sys::siocethtool(sock.as_raw_fd(), &mut ifreq) }.map_err(|errno| {
        SocketError::InterfaceQuery {
            request: "SIOCETHTOOL",
            device: name.to_string(),
            source: io::Error::from(errno),
        }
    })?;
    Ok(info)
}

/// Timestamping capabilities the driver of `name` reports.
///
/// Never fails: a query error is logged and yields a descriptor with
/// `valid == false` and every other field zero.
#[must_use]
pub fn timestamp_capabilities(name: &str) -> TimestampCapabilities {
    match query_ts_info(name) {
        Ok(info) => TimestampCapabilities {
            valid: true,
            phc_index: info.phc_index,
            so_timestamping: info.so_timestamping,
            tx_types: info.tx_types,
            rx_filters: info.rx_filters,
        },
        Err(e) => {
            error!(device = name, "ETHTOOL_GET_TS_INFO failed: {}", e);
            TimestampCapabilities::default()
        }
    }
}
