//! Raw kernel interfaces: ioctl request layouts and constants that are not
//! (reliably) exported by `libc`.

use std::ffi::CString;
use std::io;

use libc::c_int;
use nix::ioctl_readwrite_bad;

use crate::error::{Result, SocketError};
use crate::net::hwts::HwTstampConfig;

/// `SO_SELECT_ERR_QUEUE` (Linux >= 3.10).
pub const SO_SELECT_ERR_QUEUE: c_int = 45;

/// `ETHTOOL_GET_TS_INFO` command.
pub const ETHTOOL_GET_TS_INFO: u32 = 0x0000_0041;

const SIOCGIFHWADDR: u16 = 0x8927;
const SIOCGIFINDEX: u16 = 0x8933;
const SIOCETHTOOL: u16 = 0x8946;
const SIOCSHWTSTAMP: u16 = 0x89b0;

/// The request union of `struct ifreq`, restricted to the members used here.
#[repr(C)]
#[derive(Copy, Clone)]
pub union IfrIfru {
    pub hwaddr: libc::sockaddr,
    pub ifindex: c_int,
    pub data: *mut libc::c_void,
    // struct ifmap is the largest member on 64-bit targets.
    _size: [u8; 24],
}

/// `struct ifreq`.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct Ifreq {
    pub ifr_name: [libc::c_char; libc::IFNAMSIZ],
    pub ifr_ifru: IfrIfru,
}

impl Ifreq {
    /// A zeroed request for the named interface.
    pub fn new(name: &str) -> Result<Self> {
        let invalid = || SocketError::InvalidInterfaceName {
            name: name.to_string(),
        };
        let cname = CString::new(name).map_err(|_| invalid())?;
        let bytes = cname.as_bytes_with_nul();
        if bytes.len() > libc::IFNAMSIZ {
            return Err(invalid());
        }

        let mut ifreq = Self {
            ifr_name: [0; libc::IFNAMSIZ],
            ifr_ifru: IfrIfru { _size: [0; 24] },
        };
        for (to, from) in ifreq.ifr_name.iter_mut().zip(bytes) {
            *to = *from as libc::c_char;
        }
        Ok(ifreq)
    }
}

/// `struct ethtool_ts_info`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct EthtoolTsInfo {
    pub cmd: u32,
    pub so_timestamping: u32,
    pub phc_index: i32,
    pub tx_types: u32,
    pub tx_reserved: [u32; 3],
    pub rx_filters: u32,
    pub rx_reserved: [u32; 3],
}

ioctl_readwrite_bad!(siocgifindex, SIOCGIFINDEX, Ifreq);
ioctl_readwrite_bad!(siocgifhwaddr, SIOCGIFHWADDR, Ifreq);
ioctl_readwrite_bad!(siocethtool, SIOCETHTOOL, Ifreq);
ioctl_readwrite_bad!(siocshwtstamp, SIOCSHWTSTAMP, Ifreq);

/// Issue `SIOCSHWTSTAMP`; the driver writes the granted configuration back.
pub fn set_hwtstamp(fd: c_int, device: &str, config: &mut HwTstampConfig) -> io::Result<()> {
    let mut ifreq =
        Ifreq::new(device).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    ifreq.ifr_ifru.data = std::ptr::from_mut(config).cast();
    // SAFETY: ifreq is a valid, initialized request whose data pointer
    // refers to a live hwtstamp_config for the duration of the call.
    unsafe { siocshwtstamp(fd, &mut ifreq) }?;
    Ok(())
}
