//! Integration tests for software timestamping.
//!
//! Runs the real socket layer over the loopback interface, which supports
//! software timestamps on every Linux kernel.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use ptp_timestamping::net::{
    PtpSocket, RecvMode, SocketIo, TimestampedSocket, control_socket, interface_addr,
    interface_index, interface_mac, timestamp_capabilities,
};
use ptp_timestamping::protocol::ptp::PTP_ETHERTYPE;
use ptp_timestamping::types::{Address, AddressFamily, MacAddr};
use ptp_timestamping::{SocketConfig, SocketError, TimestampClass, TransportKind};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn bound_udp() -> UdpSocket {
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    sock
}

fn software_socket(udp: UdpSocket, config: &SocketConfig) -> TimestampedSocket<PtpSocket> {
    TimestampedSocket::configure(
        PtpSocket::from(udp),
        "lo",
        TimestampClass::Software,
        TransportKind::UdpIpv4,
        config,
    )
    .unwrap()
}

// ===== Receive =====

#[test]
fn test_loopback_receive_is_timestamped() {
    init_tracing();
    let receiver = bound_udp();
    let receiver_addr = receiver.local_addr().unwrap();
    let mut sock = software_socket(receiver, &SocketConfig::default());

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    let sender_addr = sender.local_addr().unwrap();
    sender.send_to(&[0x5A; 44], receiver_addr).unwrap();

    let mut addr = Address::unspecified();
    let mut buf = [0u8; 128];
    let rx = sock
        .receive(&mut buf, Some(&mut addr), RecvMode::Normal)
        .unwrap();

    assert_eq!(rx.len, 44);
    assert_eq!(&buf[..44], &[0x5A; 44][..]);
    assert_eq!(rx.hwts.class, TimestampClass::Software);
    assert!(rx.hwts.ts.is_some());
    assert!(!rx.hwts.value().is_zero());
    assert!(rx.forward.is_none());
    assert_eq!(addr.socket_addr(), Some(sender_addr));
}

#[test]
fn test_loopback_receive_with_fupsync_timestamp() {
    let receiver = bound_udp();
    let receiver_addr = receiver.local_addr().unwrap();
    let config = SocketConfig::builder().check_fupsync(true).build();
    let mut sock = software_socket(receiver, &config);

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender.send_to(&[1, 2, 3, 4], receiver_addr).unwrap();

    let mut buf = [0u8; 64];
    let rx = sock.receive(&mut buf, None, RecvMode::Normal).unwrap();

    assert_eq!(rx.len, 4);
    assert!(rx.hwts.sw.is_some());
}

#[test]
fn test_loopback_transmit_timestamp() {
    init_tracing();
    let receiver = bound_udp();
    let receiver_addr: SocketAddr = receiver.local_addr().unwrap();

    let sender = bound_udp();
    sender.connect(receiver_addr).unwrap();
    let config = SocketConfig::builder()
        .tx_timeout(Duration::from_secs(1))
        .build();
    let mut sock = software_socket(sender, &config);

    assert_eq!(sock.io().send(&[0xC3; 44]).unwrap(), 44);

    let mut buf = [0u8; 256];
    let tx = sock.receive(&mut buf, None, RecvMode::ErrorQueue).unwrap();
    assert!(tx.hwts.ts.is_some());

    let mut delivered = [0u8; 64];
    assert_eq!(receiver.recv(&mut delivered).unwrap(), 44);
}

#[test]
fn test_empty_error_queue_times_out() {
    let config = SocketConfig::builder()
        .tx_timeout(Duration::from_millis(5))
        .build();
    let mut sock = software_socket(bound_udp(), &config);

    let mut buf = [0u8; 64];
    let err = sock
        .receive(&mut buf, None, RecvMode::ErrorQueue)
        .unwrap_err();
    assert!(matches!(err, SocketError::TxTimestampTimeout { .. }));
}

// ===== Socket construction =====

#[test]
fn test_udp_v6_socket_accepts_software_timestamping() {
    let io = match PtpSocket::udp_v6() {
        Ok(io) => io,
        // Kernels built without IPv6.
        Err(e) if e.raw_os_error() == Some(libc::EAFNOSUPPORT) => return,
        Err(e) => panic!("udp_v6: {e}"),
    };
    io.set_nonblocking(true).unwrap();

    let sock = TimestampedSocket::configure(
        io,
        "lo",
        TimestampClass::Software,
        TransportKind::UdpIpv6,
        &SocketConfig::default(),
    )
    .unwrap();
    assert_eq!(sock.transport(), TransportKind::UdpIpv6);

    let mut buf = [0u8; 64];
    let err = sock.io().recv_msg(&mut buf, &mut [], false).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
}

#[test]
fn test_packet_socket_needs_raw_capability() {
    match PtpSocket::packet(PTP_ETHERTYPE) {
        Ok(io) => {
            let sock = TimestampedSocket::configure(
                io,
                "lo",
                TimestampClass::Software,
                TransportKind::Ieee8023,
                &SocketConfig::default(),
            )
            .unwrap();
            assert_eq!(sock.transport(), TransportKind::Ieee8023);
        }
        Err(e) => assert!(matches!(
            e.raw_os_error(),
            Some(libc::EPERM | libc::EACCES)
        )),
    }
}

// ===== DSCP =====

#[test]
fn test_set_priority_marks_dscp() {
    let sock = software_socket(bound_udp(), &SocketConfig::default());

    sock.set_priority(46).unwrap();
    assert_eq!(sock.io().tos().unwrap() >> 2, 46);

    sock.set_priority(10).unwrap();
    assert_eq!(sock.io().tos().unwrap() >> 2, 10);
}

// ===== Interface queries =====

#[test]
fn test_loopback_interface_queries() {
    let ctl = control_socket().unwrap();
    assert!(interface_index(&ctl, "lo").unwrap() > 0);
    assert_eq!(interface_mac("lo").unwrap(), MacAddr([0; 6]));

    let addr = interface_addr("lo", AddressFamily::Inet).unwrap();
    assert!(addr.socket_addr().unwrap().ip().is_loopback());
}

#[test]
fn test_unknown_interface() {
    let ctl = control_socket().unwrap();
    assert!(interface_index(&ctl, "nosuchdev0").is_err());
    assert!(interface_mac("nosuchdev0").is_err());
    assert!(matches!(
        interface_addr("nosuchdev0", AddressFamily::Inet),
        Err(SocketError::AddressNotFound { .. })
    ));
    assert!(!timestamp_capabilities("nosuchdev0").valid);
}

#[test]
fn test_overlong_interface_name() {
    let ctl = control_socket().unwrap();
    assert!(matches!(
        interface_index(&ctl, "an-interface-name-too-long"),
        Err(SocketError::InvalidInterfaceName { .. })
    ));
}
