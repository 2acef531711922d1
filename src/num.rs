//! Script number encoding.
//!
//! Bitcoin Script numbers are byte strings holding a little-endian
//! sign-magnitude integer: the most significant bit of the last byte is
//! the sign, and the encoding is minimal (no trailing `0x00`/`0x80`
//! padding beyond what the sign bit requires). Zero is the empty string.
//!
//! The field moduli and curve coordinates this crate pushes are far
//! beyond 64 bits, so the conversions work on [`BigInt`].

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::error::ScriptError;

/// Encodes an integer as a minimal script number.
pub fn encode_num(n: &BigInt) -> Vec<u8> {
    if n.is_zero() {
        return Vec::new();
    }

    let negative = n.sign() == Sign::Minus;
    let mut bytes = n.magnitude().to_bytes_le();

    // If the most significant byte has bit 0x80 set, an extra byte is
    // needed to carry the sign bit.
    if bytes.last().is_some_and(|&b| b & 0x80 != 0) {
        bytes.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        let last = bytes.len() - 1;
        bytes[last] |= 0x80;
    }

    bytes
}

/// Convenience wrapper of [`encode_num`] for machine integers.
pub fn encode_i64(n: i64) -> Vec<u8> {
    encode_num(&BigInt::from(n))
}

/// Decodes a script number, accepting non-minimal encodings.
///
/// The arithmetic opcodes in the post-Genesis rule set accept any
/// encoding on input and produce minimal encodings on output, so the
/// decoder is deliberately lenient; [`is_minimal`] exists for callers
/// that want to enforce minimality.
pub fn decode_num(bytes: &[u8]) -> BigInt {
    if bytes.is_empty() {
        return BigInt::zero();
    }

    let mut magnitude = bytes.to_vec();
    let last = magnitude.len() - 1;
    let negative = magnitude[last] & 0x80 != 0;
    magnitude[last] &= 0x7f;

    let value = BigUint::from_bytes_le(&magnitude);
    if value.is_zero() {
        return BigInt::zero();
    }
    if negative {
        -BigInt::from(value)
    } else {
        BigInt::from(value)
    }
}

/// Decodes a script number and bound-checks it into an `i64`.
///
/// Used where the engine needs a machine integer (stack indices, split
/// positions, byte widths).
pub fn decode_i64(bytes: &[u8]) -> Result<i64, ScriptError> {
    if bytes.len() > 8 {
        return Err(ScriptError::NumberTooLarge);
    }
    let n = decode_num(bytes);
    i64::try_from(n).map_err(|_| ScriptError::NumberTooLarge)
}

/// Whether `bytes` is the minimal encoding of the number it holds.
pub fn is_minimal(bytes: &[u8]) -> bool {
    match bytes.last() {
        None => true,
        // The last byte may carry only the sign bit when the byte below
        // it already has its own top bit set.
        Some(&last) => {
            if last & 0x7f != 0 {
                true
            } else if bytes.len() == 1 {
                // A lone 0x00 or 0x80 is a non-minimal zero.
                false
            } else {
                bytes[bytes.len() - 2] & 0x80 != 0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    fn enc(n: i64) -> Vec<u8> {
        encode_i64(n)
    }

    #[test]
    fn encode_zero() {
        assert_eq!(enc(0), Vec::<u8>::new());
    }

    #[test]
    fn encode_positive() {
        assert_eq!(enc(1), vec![0x01]);
        assert_eq!(enc(127), vec![0x7f]);
        assert_eq!(enc(128), vec![0x80, 0x00]); // needs sign byte
        assert_eq!(enc(255), vec![0xff, 0x00]);
        assert_eq!(enc(256), vec![0x00, 0x01]);
    }

    #[test]
    fn encode_negative() {
        assert_eq!(enc(-1), vec![0x81]);
        assert_eq!(enc(-127), vec![0xff]);
        assert_eq!(enc(-128), vec![0x80, 0x80]);
        assert_eq!(enc(-255), vec![0xff, 0x80]);
    }

    #[test]
    fn decode_roundtrip() {
        for n in [-70000i64, -256, -255, -128, -1, 0, 1, 127, 128, 255, 70000] {
            assert_eq!(decode_num(&enc(n)), BigInt::from(n), "roundtrip of {n}");
        }
    }

    #[test]
    fn decode_negative_zero() {
        assert_eq!(decode_num(&[0x80]), BigInt::zero());
        assert_eq!(decode_num(&[0x00, 0x80]), BigInt::zero());
    }

    #[test]
    fn decode_non_minimal() {
        assert_eq!(decode_num(&[0x01, 0x00]), BigInt::one());
        assert_eq!(decode_num(&[0x01, 0x80]), BigInt::from(-1));
    }

    #[test]
    fn big_roundtrip() {
        // A 381-bit prime survives the roundtrip.
        let q = BigInt::parse_bytes(
            b"1a0111ea397fe69a4b1ba7b6434bacd764774b84f38512bf6730d2a0f6b0f624\
              1eabfffeb153ffffb9feffffffffaaab",
            16,
        )
        .unwrap();
        assert_eq!(decode_num(&encode_num(&q)), q);
        assert_eq!(decode_num(&encode_num(&-&q)), -q);
    }

    #[test]
    fn minimality() {
        assert!(is_minimal(&[]));
        assert!(is_minimal(&[0x01]));
        assert!(is_minimal(&[0xff, 0x00])); // 255 needs the sign byte
        assert!(is_minimal(&[0xff, 0x80])); // -255 likewise
        assert!(!is_minimal(&[0x00]));
        assert!(!is_minimal(&[0x80]));
        assert!(!is_minimal(&[0x01, 0x00]));
    }

    #[test]
    fn decode_i64_bounds() {
        assert_eq!(decode_i64(&enc(42)).unwrap(), 42);
        assert_eq!(decode_i64(&enc(-42)).unwrap(), -42);
        let big = encode_num(&(&BigInt::from(u64::MAX) * 4u8));
        assert!(matches!(
            decode_i64(&big),
            Err(ScriptError::NumberTooLarge)
        ));
    }
}
