use crate::types::{SocketConfig, TransparentClockConfig};
use std::time::Duration;

#[test]
fn test_config_defaults() {
    let config = SocketConfig::default();

    assert_eq!(config.tx_timeout, Duration::from_millis(1));
    assert!(!config.check_fupsync);
    assert_eq!(config.transparent_clock.meta_timeout, Duration::from_millis(1));
    assert_eq!(config.transparent_clock.port_mask, 0x1F);
    assert_eq!(config.transparent_clock.host_port, 4);
    assert_eq!(config.transparent_clock.tick_ns, 8);
}

#[test]
fn test_config_builder() {
    let config = SocketConfig::builder()
        .tx_timeout(Duration::from_millis(10))
        .check_fupsync(true)
        .meta_timeout(Duration::from_millis(3))
        .build();

    assert_eq!(config.tx_timeout, Duration::from_millis(10));
    assert!(config.check_fupsync);
    assert_eq!(config.transparent_clock.meta_timeout, Duration::from_millis(3));
}

#[test]
fn test_config_builder_replaces_transparent_clock() {
    let tc = TransparentClockConfig {
        port_mask: 0x0F,
        host_port: 3,
        ..TransparentClockConfig::default()
    };
    let config = SocketConfig::builder().transparent_clock(tc.clone()).build();
    assert_eq!(config.transparent_clock, tc);
}

#[test]
fn test_config_deserialize_partial() {
    let json = r#"{ "tx_timestamp_timeout_ms": 25, "transparent_clock": { "host_port": 2 } }"#;
    let config: SocketConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.tx_timeout, Duration::from_millis(25));
    assert!(!config.check_fupsync);
    assert_eq!(config.transparent_clock.host_port, 2);
    assert_eq!(config.transparent_clock.port_mask, 0x1F);
}

#[test]
fn test_config_serialize_uses_milliseconds() {
    let value = serde_json::to_value(SocketConfig::default()).unwrap();
    assert_eq!(value["tx_timestamp_timeout_ms"], 1);
    assert_eq!(value["transparent_clock"]["meta_timeout_ms"], 1);
}
