use crate::protocol::ptp::PtpTimestamp;
use crate::types::{HardwareTimestamp, TimestampCapabilities, TimestampClass, TransportKind};

#[test]
fn test_timestamping_index_per_class() {
    assert_eq!(TimestampClass::Software.timestamping_index(), 0);
    assert_eq!(TimestampClass::LegacyHardware.timestamping_index(), 1);
    assert_eq!(TimestampClass::Hardware.timestamping_index(), 2);
    assert_eq!(TimestampClass::OneStep.timestamping_index(), 2);
}

#[test]
fn test_is_hardware() {
    assert!(!TimestampClass::Software.is_hardware());
    assert!(TimestampClass::Hardware.is_hardware());
    assert!(TimestampClass::OneStep.is_hardware());
    assert!(TimestampClass::LegacyHardware.is_hardware());
}

#[test]
fn test_class_serde_names() {
    let class: TimestampClass = serde_json::from_str("\"one_step\"").unwrap();
    assert_eq!(class, TimestampClass::OneStep);
    let transport: TransportKind = serde_json::from_str("\"ieee8023\"").unwrap();
    assert_eq!(transport, TransportKind::Ieee8023);
}

#[test]
fn test_hardware_timestamp_value_defaults_to_zero() {
    let mut hwts = HardwareTimestamp::new(TimestampClass::Hardware);
    assert_eq!(hwts.value(), PtpTimestamp::ZERO);
    hwts.ts = Some(PtpTimestamp::new(5, 6));
    assert_eq!(hwts.value(), PtpTimestamp::new(5, 6));
}

#[test]
fn test_invalid_capabilities_support_nothing() {
    let caps = TimestampCapabilities {
        valid: false,
        so_timestamping: u32::MAX,
        tx_types: u32::MAX,
        rx_filters: u32::MAX,
        phc_index: 0,
    };
    assert!(!caps.supports_flags(1));
    assert!(!caps.supports_tx_type(1));
    assert!(!caps.supports_rx_filter(12));
    assert_eq!(caps.phc(), None);
}

#[test]
fn test_valid_capabilities() {
    let caps = TimestampCapabilities {
        valid: true,
        phc_index: 2,
        so_timestamping: 0b0101,
        tx_types: 0b0110,
        rx_filters: 1 << 12,
    };
    assert!(caps.supports_flags(0b0100));
    assert!(!caps.supports_flags(0b0110));
    assert!(caps.supports_tx_type(2));
    assert!(!caps.supports_tx_type(0));
    assert!(!caps.supports_tx_type(40));
    assert!(caps.supports_rx_filter(12));
    assert_eq!(caps.phc(), Some(2));
}

#[test]
fn test_capabilities_without_phc() {
    let caps = TimestampCapabilities {
        valid: true,
        phc_index: -1,
        ..TimestampCapabilities::default()
    };
    assert_eq!(caps.phc(), None);
}
