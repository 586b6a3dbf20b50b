// crates/sync-protocol/tests/wire_format.rs

use bytes::Bytes;
use sync_core::{ClientMessage, FrameAdvance, FramePayload};
use sync_protocol::{
    decode_bytes_payload, decode_ints_payload, encode_payload, format_advance, parse_advance_line,
    parse_client_line, AdvanceLine, PayloadKind, ProtocolError,
};

#[test]
fn control_line_shapes() {
    assert_eq!(format_advance(&FrameAdvance::bare(0)), "G,0");

    let with_text = FrameAdvance {
        frame: 0,
        text: Some("hello".to_string()),
        payload: None,
    };
    assert_eq!(format_advance(&with_text), "G,0:hello");

    let with_bytes = FrameAdvance {
        frame: 4,
        text: None,
        payload: Some(FramePayload::Bytes(Bytes::from_static(&[1, 2, 3]))),
    };
    assert_eq!(format_advance(&with_bytes), "BG,4");

    let with_ints_and_text = FrameAdvance {
        frame: 7,
        text: Some("note".to_string()),
        payload: Some(FramePayload::Ints(vec![5])),
    };
    assert_eq!(format_advance(&with_ints_and_text), "IG,7:note");
}

#[test]
fn control_line_parses_back() {
    assert_eq!(
        parse_advance_line("G,12\n"),
        Some(AdvanceLine {
            frame: 12,
            text: None,
            payload: None,
        })
    );

    assert_eq!(
        parse_advance_line("BG,3:stats"),
        Some(AdvanceLine {
            frame: 3,
            text: Some("stats".to_string()),
            payload: Some(PayloadKind::Bytes),
        })
    );

    // Text may itself contain the separator; only the first one splits.
    assert_eq!(
        parse_advance_line("IG,9:a:b"),
        Some(AdvanceLine {
            frame: 9,
            text: Some("a:b".to_string()),
            payload: Some(PayloadKind::Ints),
        })
    );

    assert_eq!(parse_advance_line("X,1"), None);
    assert_eq!(parse_advance_line("G,notanumber"), None);
}

#[test]
fn client_line_grammar() {
    assert_eq!(parse_client_line("S"), Some(ClientMessage::Start));
    assert_eq!(parse_client_line("S\r\n"), Some(ClientMessage::Start));
    assert_eq!(parse_client_line("D"), Some(ClientMessage::Ready));
    assert_eq!(
        parse_client_line("T,hello"),
        Some(ClientMessage::Broadcast("hello".to_string()))
    );
    // Broadcast text is taken verbatim, separators included.
    assert_eq!(
        parse_client_line("T,a:b"),
        Some(ClientMessage::Broadcast("a:b".to_string()))
    );

    assert_eq!(parse_client_line(""), None);
    assert_eq!(parse_client_line("   "), None);
    assert_eq!(parse_client_line("G,0"), None);
    assert_eq!(parse_client_line("X"), None);
}

#[test]
fn byte_payload_frame_roundtrip() {
    let payload = FramePayload::Bytes(Bytes::from_static(&[1, 2, 3]));

    let mut frame = Vec::new();
    encode_payload(&payload, &mut frame).unwrap();
    assert_eq!(frame, vec![0, 0, 0, 3, 1, 2, 3]);

    let decoded = decode_bytes_payload(&frame).unwrap();
    assert_eq!(&decoded[..], &[1, 2, 3]);
}

#[test]
fn int_payload_frame_roundtrip() {
    let payload = FramePayload::Ints(vec![-1, 7]);

    let mut frame = Vec::new();
    encode_payload(&payload, &mut frame).unwrap();
    assert_eq!(
        frame,
        vec![0, 0, 0, 2, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 7]
    );

    assert_eq!(decode_ints_payload(&frame).unwrap(), vec![-1, 7]);
}

#[test]
fn empty_payload_frames() {
    let mut frame = Vec::new();
    encode_payload(&FramePayload::Bytes(Bytes::new()), &mut frame).unwrap();
    assert_eq!(frame, vec![0, 0, 0, 0]);
    assert!(decode_bytes_payload(&frame).unwrap().is_empty());
}

#[test]
fn truncated_payload_frames_are_rejected() {
    assert!(matches!(
        decode_bytes_payload(&[0, 0]),
        Err(ProtocolError::Truncated)
    ));

    // Count promises 3 bytes, body has 2.
    assert!(matches!(
        decode_bytes_payload(&[0, 0, 0, 3, 1, 2]),
        Err(ProtocolError::Truncated)
    ));

    // Count promises 2 ints, body has 1.
    assert!(matches!(
        decode_ints_payload(&[0, 0, 0, 2, 0, 0, 0, 1]),
        Err(ProtocolError::Truncated)
    ));
}
