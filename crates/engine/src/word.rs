//! Word codec: 4-byte little-endian signed integers.
//!
//! Every immediate operand and every tape word uses this one encoding.

/// Unit of stack values and arithmetic.
pub type Word = i32;

/// Width of a [`Word`] in bytes.
pub const WORD_SIZE: usize = 4;

pub fn encode(value: Word) -> [u8; WORD_SIZE] {
    value.to_le_bytes()
}

/// Writes `value` into the first [`WORD_SIZE`] bytes of `out`.
///
/// Returns `false` without touching `out` when it is too short.
pub fn encode_into(value: Word, out: &mut [u8]) -> bool {
    match out.get_mut(..WORD_SIZE) {
        Some(slot) => {
            slot.copy_from_slice(&encode(value));
            true
        }
        None => false,
    }
}

/// Decodes the first [`WORD_SIZE`] bytes of `bytes`; `None` if fewer are supplied.
pub fn decode(bytes: &[u8]) -> Option<Word> {
    let raw: [u8; WORD_SIZE] = bytes.get(..WORD_SIZE)?.try_into().ok()?;
    Some(Word::from_le_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn little_endian_layout() {
        assert_eq!(encode(1), [1, 0, 0, 0]);
        assert_eq!(encode(-2), [0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(encode(0x0102_0304), [4, 3, 2, 1]);
    }

    #[test]
    fn decode_short_input() {
        assert_eq!(decode(&[1, 2, 3]), None);
        assert_eq!(decode(&[]), None);
        // extra bytes are ignored
        assert_eq!(decode(&[7, 0, 0, 0, 0xff]), Some(7));
    }

    #[test]
    fn encode_into_short_buffer() {
        let mut buf = [9u8; 3];
        assert!(!encode_into(5, &mut buf));
        assert_eq!(buf, [9, 9, 9]);
    }

    proptest! {
        #[test]
        fn round_trip(v in any::<i32>()) {
            prop_assert_eq!(decode(&encode(v)), Some(v));
        }

        #[test]
        fn round_trip_through_buffer(v in any::<i32>(), pad in 0usize..8) {
            let mut buf = vec![0u8; WORD_SIZE + pad];
            prop_assert!(encode_into(v, &mut buf));
            prop_assert_eq!(decode(&buf), Some(v));
        }
    }
}
