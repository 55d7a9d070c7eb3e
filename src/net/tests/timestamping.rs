use std::time::Duration;

use nix::poll::PollFlags;

use crate::error::SocketError;
use crate::net::hwts::rx_filter;
use crate::net::{
    KernelTimestamps, TimestampedSocket, TxPollMask, fallback_filter, general_init,
    timestamping_flags, timestamping_init,
};
use crate::testing::{MockOption, MockSocket};
use crate::types::{SocketConfig, TimestampClass, TransportKind};

fn init(
    sock: &MockSocket,
    class: TimestampClass,
    transport: TransportKind,
) -> crate::Result<TxPollMask> {
    timestamping_init(sock, "eth0", class, transport, &SocketConfig::default())
}

// ===== Flags =====

#[test]
fn test_flags_software() {
    assert_eq!(
        timestamping_flags(TimestampClass::Software),
        libc::SOF_TIMESTAMPING_TX_SOFTWARE
            | libc::SOF_TIMESTAMPING_RX_SOFTWARE
            | libc::SOF_TIMESTAMPING_SOFTWARE
    );
}

#[test]
fn test_flags_hardware_and_one_step_match() {
    let raw = libc::SOF_TIMESTAMPING_TX_HARDWARE
        | libc::SOF_TIMESTAMPING_RX_HARDWARE
        | libc::SOF_TIMESTAMPING_RAW_HARDWARE;
    assert_eq!(timestamping_flags(TimestampClass::Hardware), raw);
    assert_eq!(timestamping_flags(TimestampClass::OneStep), raw);
}

#[test]
fn test_flags_legacy_hardware() {
    assert_eq!(
        timestamping_flags(TimestampClass::LegacyHardware),
        libc::SOF_TIMESTAMPING_TX_HARDWARE
            | libc::SOF_TIMESTAMPING_RX_HARDWARE
            | libc::SOF_TIMESTAMPING_SYS_HARDWARE
    );
}

// ===== Filter fallback =====

#[test]
fn test_fallback_filter_per_transport() {
    assert_eq!(
        fallback_filter(TransportKind::UdpIpv4).unwrap(),
        rx_filter::PTP_V2_L4_EVENT
    );
    assert_eq!(
        fallback_filter(TransportKind::UdpIpv6).unwrap(),
        rx_filter::PTP_V2_L4_EVENT
    );
    assert_eq!(
        fallback_filter(TransportKind::Ieee8023).unwrap(),
        rx_filter::PTP_V2_L2_EVENT
    );
}

#[test]
fn test_fallback_filter_unsupported() {
    for transport in [
        TransportKind::DeviceNet,
        TransportKind::ControlNet,
        TransportKind::Profinet,
        TransportKind::UnixDomain,
    ] {
        assert!(matches!(
            fallback_filter(transport),
            Err(SocketError::UnsupportedTransport(t)) if t == transport
        ));
    }
}

// ===== timestamping_init =====

#[test]
fn test_init_software_skips_driver() {
    let sock = MockSocket::new();
    let mask = init(&sock, TimestampClass::Software, TransportKind::UdpIpv4).unwrap();

    assert!(sock.hwtstamp_requests().is_empty());
    assert_eq!(
        sock.timestamping_flags(),
        Some(timestamping_flags(TimestampClass::Software))
    );
    assert_eq!(sock.select_err_queue(), Some(true));
    assert_eq!(sock.timestamp_ns(), Some(false));
    assert_eq!(mask, TxPollMask::err_queue_selected());
}

#[test]
fn test_init_software_ignores_transport() {
    let sock = MockSocket::new();
    assert!(init(&sock, TimestampClass::Software, TransportKind::DeviceNet).is_ok());
}

#[test]
fn test_init_hardware_primary_filter() {
    let sock = MockSocket::new();
    init(&sock, TimestampClass::Hardware, TransportKind::UdpIpv4).unwrap();

    let requests = sock.hwtstamp_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1.rx_filter, rx_filter::PTP_V2_EVENT);
}

#[test]
fn test_init_falls_back_to_l4_filter() {
    let sock = MockSocket::new();
    sock.push_hwtstamp_error(libc::ERANGE);

    init(&sock, TimestampClass::Hardware, TransportKind::UdpIpv6).unwrap();

    let filters: Vec<i32> = sock
        .hwtstamp_requests()
        .iter()
        .map(|(_, cfg)| cfg.rx_filter)
        .collect();
    assert_eq!(filters, vec![rx_filter::PTP_V2_EVENT, rx_filter::PTP_V2_L4_EVENT]);
}

#[test]
fn test_init_falls_back_to_l2_filter_one_step() {
    let sock = MockSocket::new();
    sock.push_hwtstamp_error(libc::ERANGE);

    init(&sock, TimestampClass::OneStep, TransportKind::Ieee8023).unwrap();

    let requests = sock.hwtstamp_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].1.rx_filter, rx_filter::PTP_V2_L2_EVENT);
    assert_eq!(requests[1].1.tx_type, crate::net::hwts::tx_type::ONESTEP_SYNC);
}

#[test]
fn test_init_both_filters_rejected() {
    let sock = MockSocket::new();
    sock.push_hwtstamp_error(libc::ERANGE);
    sock.push_hwtstamp_error(libc::EINVAL);

    let err = init(&sock, TimestampClass::Hardware, TransportKind::UdpIpv4).unwrap_err();

    assert!(matches!(err, SocketError::DeviceRejected { .. }));
    assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
    assert_eq!(sock.timestamping_flags(), None);
}

#[test]
fn test_init_hardware_unsupported_transport() {
    let sock = MockSocket::new();
    let err = init(&sock, TimestampClass::LegacyHardware, TransportKind::Profinet).unwrap_err();

    assert!(matches!(
        err,
        SocketError::UnsupportedTransport(TransportKind::Profinet)
    ));
    assert!(sock.hwtstamp_requests().is_empty());
}

#[test]
fn test_init_timestamping_option_failure() {
    let sock = MockSocket::new();
    sock.fail_option(MockOption::Timestamping, libc::EINVAL);

    let err = init(&sock, TimestampClass::Software, TransportKind::UdpIpv4).unwrap_err();
    assert!(matches!(
        err,
        SocketError::SocketOption {
            option: "SO_TIMESTAMPING",
            ..
        }
    ));
}

#[test]
fn test_init_without_select_err_queue_degrades() {
    let sock = MockSocket::new();
    sock.fail_option(MockOption::SelectErrQueue, libc::ENOPROTOOPT);

    let mask = init(&sock, TimestampClass::Software, TransportKind::UdpIpv4).unwrap();

    assert_eq!(mask, TxPollMask::degraded());
    assert!(mask.events.is_empty());
    assert_eq!(mask.revents, PollFlags::POLLERR);
}

#[test]
fn test_init_enables_fupsync_timestamps() {
    let sock = MockSocket::new();
    let config = SocketConfig::builder().check_fupsync(true).build();

    timestamping_init(
        &sock,
        "eth0",
        TimestampClass::Hardware,
        TransportKind::UdpIpv4,
        &config,
    )
    .unwrap();
    assert_eq!(sock.timestamp_ns(), Some(true));
}

#[test]
fn test_general_init_failure_is_fatal() {
    let sock = MockSocket::new();
    sock.fail_option(MockOption::TimestampNs, libc::EINVAL);

    let err = general_init(&sock, false).unwrap_err();
    assert!(matches!(
        err,
        SocketError::SocketOption {
            option: "SO_TIMESTAMPNS",
            ..
        }
    ));
}

// ===== TimestampedSocket =====

#[test]
fn test_configure_keeps_own_config() {
    let fast = SocketConfig::builder()
        .tx_timeout(Duration::from_millis(5))
        .build();
    let slow = SocketConfig::builder()
        .tx_timeout(Duration::from_millis(50))
        .check_fupsync(true)
        .build();

    let sock = TimestampedSocket::configure(
        MockSocket::new(),
        "eth1",
        TimestampClass::Hardware,
        TransportKind::Ieee8023,
        &fast,
    )
    .unwrap();
    let other = TimestampedSocket::configure(
        MockSocket::new(),
        "eth2",
        TimestampClass::Software,
        TransportKind::UdpIpv4,
        &slow,
    )
    .unwrap();

    assert_eq!(sock.config(), &fast);
    assert_eq!(other.config(), &slow);
    assert_ne!(sock.config().tx_timeout, other.config().tx_timeout);
    assert!(!sock.config().check_fupsync);
    assert_eq!(sock.device(), "eth1");
    assert_eq!(sock.class(), TimestampClass::Hardware);
    assert_eq!(sock.transport(), TransportKind::Ieee8023);
    assert_eq!(*sock.strategy(), KernelTimestamps);
    assert_eq!(other.device(), "eth2");
}

#[test]
fn test_configure_records_degraded_mask_per_socket() {
    let degraded = MockSocket::new();
    degraded.fail_option(MockOption::SelectErrQueue, libc::ENOPROTOOPT);
    let config = SocketConfig::default();

    let a = TimestampedSocket::configure(
        degraded,
        "eth0",
        TimestampClass::Software,
        TransportKind::UdpIpv4,
        &config,
    )
    .unwrap();
    let b = TimestampedSocket::configure(
        MockSocket::new(),
        "eth0",
        TimestampClass::Software,
        TransportKind::UdpIpv4,
        &config,
    )
    .unwrap();

    assert_eq!(a.tx_poll(), TxPollMask::degraded());
    assert_eq!(b.tx_poll(), TxPollMask::err_queue_selected());
}

#[test]
fn test_socket_set_priority() {
    let sock = TimestampedSocket::configure(
        MockSocket::new(),
        "eth0",
        TimestampClass::Software,
        TransportKind::UdpIpv4,
        &SocketConfig::default(),
    )
    .unwrap();

    sock.set_priority(46).unwrap();
    assert_eq!(sock.io().tos_value(), 0xB8);
}
