//! # Word Record Tests
//!
//! Rendering and parsing of single memory words, plus properties of the pure image encoding.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use tbrun_core::image::{MemoryWord, ParseWordError, encode_words, parse_image, render_image};

#[rstest]
#[case::single_word(&[0x01, 0x02, 0x03, 0x04], "04030201\n")]
#[case::trailing_byte_dropped(&[0x00, 0x00, 0x00, 0x01, 0xFF], "01000000\n")]
#[case::empty(&[], "")]
#[case::short_input(&[0xAA, 0xBB, 0xCC], "")]
#[case::nop_then_ebreak(
    &[0x13, 0x00, 0x00, 0x00, 0x73, 0x00, 0x10, 0x00],
    "00000013\n00100073\n"
)]
#[case::lowercase_digits(&[0xEF, 0xBE, 0xAD, 0xDE], "deadbeef\n")]
fn test_render_image(#[case] bytes: &[u8], #[case] expected: &str) {
    assert_eq!(render_image(bytes), expected);
}

#[test]
fn test_word_window_is_little_endian() {
    let word = MemoryWord::from_window([0x01, 0x02, 0x03, 0x04]);
    assert_eq!(word, MemoryWord(0x0403_0201));
    assert_eq!(word.to_string(), "04030201");
    assert_eq!(word.to_window(), [0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn test_word_display_pads_to_eight_digits() {
    assert_eq!(MemoryWord(0).to_string(), "00000000");
    assert_eq!(MemoryWord(0x13).to_string(), "00000013");
}

#[test]
fn test_word_parse_accepts_record() {
    let word: MemoryWord = "00100073".parse().unwrap();
    assert_eq!(word, MemoryWord(0x0010_0073));
}

#[rstest]
#[case::too_short("0403020")]
#[case::too_long("040302010")]
#[case::empty("")]
fn test_word_parse_rejects_length(#[case] record: &str) {
    let err = record.parse::<MemoryWord>().unwrap_err();
    assert!(matches!(err, ParseWordError::Length { .. }), "{err:?}");
}

#[rstest]
#[case::uppercase("DEADBEEF")]
#[case::non_hex("0403020g")]
#[case::sign("+4030201")]
#[case::whitespace("0403 201")]
fn test_word_parse_rejects_digits(#[case] record: &str) {
    let err = record.parse::<MemoryWord>().unwrap_err();
    assert!(matches!(err, ParseWordError::Digit { .. }), "{err:?}");
}

#[test]
fn test_parse_image_reports_line_number() {
    let err = parse_image("00000013\nxyz\n").unwrap_err();
    match err {
        ParseWordError::Line { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_parse_image_rejects_blank_line() {
    assert!(parse_image("00000013\n\n00000013\n").is_err());
}

proptest! {
    #[test]
    fn prop_aligned_input_round_trips(windows in prop::collection::vec(any::<[u8; 4]>(), 0..128)) {
        let bytes = windows.concat();
        let text = render_image(&bytes);

        prop_assert_eq!(text.lines().count(), windows.len());
        for line in text.lines() {
            prop_assert_eq!(line.len(), 8);
            prop_assert!(line.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        }
        for (line, window) in text.lines().zip(&windows) {
            let word: MemoryWord = line.parse().unwrap();
            prop_assert_eq!(&word.to_window(), window);
        }
        prop_assert_eq!(parse_image(&text).unwrap(), bytes);
    }

    #[test]
    fn prop_trailing_bytes_never_encoded(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let aligned = bytes.len() / 4 * 4;

        prop_assert_eq!(encode_words(&bytes).len(), bytes.len() / 4);
        prop_assert_eq!(parse_image(&render_image(&bytes)).unwrap(), bytes[..aligned].to_vec());
    }
}
