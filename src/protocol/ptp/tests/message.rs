use crate::protocol::ptp::message::*;

fn follow_up_frame(sequence_id: u16) -> Vec<u8> {
    let mut buf = vec![0u8; 44];
    buf[0] = 0x08;
    buf[1] = 0x02;
    buf[2..4].copy_from_slice(&44u16.to_be_bytes());
    buf[30..32].copy_from_slice(&sequence_id.to_be_bytes());
    buf
}

// ===== PtpMessageType =====

#[test]
fn test_message_type_from_nibble_follow_up() {
    assert_eq!(
        PtpMessageType::from_nibble(0x08).unwrap(),
        PtpMessageType::FollowUp
    );
}

#[test]
fn test_message_type_from_nibble_masks_upper_bits() {
    // transportSpecific lives in the upper nibble.
    assert_eq!(
        PtpMessageType::from_nibble(0x10).unwrap(),
        PtpMessageType::Sync
    );
}

#[test]
fn test_message_type_from_nibble_unknown() {
    assert_eq!(
        PtpMessageType::from_nibble(0x0F),
        Err(PtpParseError::UnknownMessageType(0x0F))
    );
}

#[test]
fn test_message_type_is_event() {
    assert!(PtpMessageType::Sync.is_event());
    assert!(PtpMessageType::PDelayResp.is_event());
    assert!(!PtpMessageType::FollowUp.is_event());
    assert!(!PtpMessageType::Announce.is_event());
}

#[test]
fn test_message_type_display() {
    assert_eq!(PtpMessageType::FollowUp.to_string(), "Follow_Up");
    assert_eq!(PtpMessageType::DelayReq.to_string(), "Delay_Req");
}

// ===== PtpHeaderView =====

#[test]
fn test_header_view_too_short() {
    let buf = [0u8; 33];
    let err = PtpHeaderView::new(&buf[..]).unwrap_err();
    assert_eq!(err, PtpParseError::TooShort { needed: 34, have: 33 });
}

#[test]
fn test_header_view_reads_fields() {
    let mut buf = follow_up_frame(0xBEEF);
    buf[8..16].copy_from_slice(&(-2i64).to_be_bytes());
    let view = PtpHeaderView::new(&buf[..]).unwrap();
    assert_eq!(view.message_type().unwrap(), PtpMessageType::FollowUp);
    assert_eq!(view.message_length(), 44);
    assert_eq!(view.sequence_id(), 0xBEEF);
    assert_eq!(view.correction_field(), -2);
}

#[test]
fn test_header_view_set_correction_is_big_endian() {
    let mut buf = follow_up_frame(1);
    let mut view = PtpHeaderView::new(&mut buf[..]).unwrap();
    view.set_correction_field(0x0102_0304_0506_0708);
    assert_eq!(view.correction_field(), 0x0102_0304_0506_0708);
    assert_eq!(&buf[8..16], &[1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn test_header_view_setters_leave_other_fields() {
    let mut buf = follow_up_frame(7);
    let before = buf.clone();
    let mut view = PtpHeaderView::new(&mut buf[..]).unwrap();
    view.set_sequence_id(9);
    view.set_message_length(40);
    assert_eq!(view.sequence_id(), 9);
    assert_eq!(view.message_length(), 40);
    assert_eq!(&buf[4..30], &before[4..30]);
}
