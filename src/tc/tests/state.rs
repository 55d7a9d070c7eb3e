use crate::protocol::ptp::{PtpHeaderView, PtpMessageType};
use crate::tc::{ETH_HLEN, RetainedSync, TransparentClockState};
use crate::testing::{ptp_frame, ts};

const FOLLOW_UP: u8 = 0x8;
const SYNC: u8 = 0x0;

fn message(message_type: u8, sequence_id: u16) -> Vec<u8> {
    ptp_frame(message_type, sequence_id)[ETH_HLEN..].to_vec()
}

fn correction(msg: &[u8]) -> i64 {
    PtpHeaderView::new(msg).unwrap().correction_field()
}

fn master_with_sync(sequence_id: u16) -> TransparentClockState {
    let mut state = TransparentClockState::new();
    state.set_master_setup(true);
    state.record_forward(PtpMessageType::Sync, sequence_id, Some(ts(5, 250)));
    state
}

#[test]
fn test_new_state_is_empty() {
    let state = TransparentClockState::new();
    assert!(!state.master_setup());
    assert_eq!(state.retained_sync(), None);
    assert_eq!(state.last_egress(), None);
}

#[test]
fn test_forwarded_sync_is_retained() {
    let state = master_with_sync(42);
    assert_eq!(
        state.retained_sync(),
        Some(RetainedSync {
            sequence_id: 42,
            egress: Some(ts(5, 250)),
        })
    );
    assert_eq!(state.last_egress(), Some(ts(5, 250)));
}

#[test]
fn test_other_messages_only_update_last_egress() {
    let mut state = master_with_sync(42);
    state.record_forward(PtpMessageType::DelayReq, 9, Some(ts(6, 0)));

    assert_eq!(state.retained_sync().unwrap().sequence_id, 42);
    assert_eq!(state.retained_sync().unwrap().egress, Some(ts(5, 250)));
    assert_eq!(state.last_egress(), Some(ts(6, 0)));
}

#[test]
fn test_missed_egress_clears_last_egress() {
    let mut state = master_with_sync(42);
    state.record_forward(PtpMessageType::PDelayReq, 1, None);
    assert_eq!(state.last_egress(), None);
}

#[test]
fn test_insert_correction_on_match() {
    let state = master_with_sync(42);
    let mut msg = message(FOLLOW_UP, 42);

    assert!(state.insert_correction(&mut msg).unwrap());
    assert_eq!(correction(&msg), 5_000_000_250);
    assert_eq!(&msg[8..16], &5_000_000_250i64.to_be_bytes());
}

#[test]
fn test_insert_correction_sequence_mismatch() {
    let state = master_with_sync(42);
    let mut msg = message(FOLLOW_UP, 43);
    let before = msg.clone();

    assert!(!state.insert_correction(&mut msg).unwrap());
    assert_eq!(msg, before);
}

#[test]
fn test_insert_correction_needs_master_setup() {
    let mut state = master_with_sync(42);
    state.set_master_setup(false);
    let mut msg = message(FOLLOW_UP, 42);

    assert!(!state.insert_correction(&mut msg).unwrap());
    assert_eq!(correction(&msg), 0);
}

#[test]
fn test_insert_correction_needs_retained_sync() {
    let mut state = TransparentClockState::new();
    state.set_master_setup(true);
    let mut msg = message(FOLLOW_UP, 0);

    assert!(!state.insert_correction(&mut msg).unwrap());
}

#[test]
fn test_insert_correction_needs_sync_egress() {
    let mut state = TransparentClockState::new();
    state.set_master_setup(true);
    state.retain_sync(42);
    let mut msg = message(FOLLOW_UP, 42);

    assert!(!state.insert_correction(&mut msg).unwrap());
    assert_eq!(state.correction_for(42), None);
}

#[test]
fn test_insert_correction_ignores_sync() {
    let state = master_with_sync(42);
    let mut msg = message(SYNC, 42);

    assert!(!state.insert_correction(&mut msg).unwrap());
    assert_eq!(correction(&msg), 0);
}

#[test]
fn test_insert_correction_short_message() {
    let state = master_with_sync(42);
    let mut msg = vec![0u8; 10];
    assert!(state.insert_correction(&mut msg).is_err());
}

#[test]
fn test_reset_forgets_everything() {
    let mut state = master_with_sync(42);
    state.reset();
    assert_eq!(state, TransparentClockState::default());
}
