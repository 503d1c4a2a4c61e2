//! Base58 text encoding for signatures, public keys and blockhashes.
//!
//! Uses the Bitcoin/Solana alphabet, which omits `0`, `O`, `I` and `l`.

use thiserror::Error;

/// The 58-character alphabet. Index 0 (`'1'`) is the zero symbol.
pub const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Errors produced while decoding base58 text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid base58 character {ch:?} at position {index}")]
    InvalidCharacter { ch: char, index: usize },
}

/// Encode bytes as base58 text.
///
/// The buffer is read as one big-endian unsigned integer and repeatedly
/// divided by 58. Each leading zero byte contributes one leading `'1'`.
pub fn encode(input: &[u8]) -> String {
    let zeros = input.iter().take_while(|&&b| b == 0).count();

    // Little-endian base-58 digits of the non-zero tail.
    let mut digits: Vec<u8> = Vec::with_capacity(input.len() * 138 / 100 + 1);
    for &byte in &input[zeros..] {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    for _ in 0..zeros {
        out.push(ALPHABET[0] as char);
    }
    for &digit in digits.iter().rev() {
        out.push(ALPHABET[digit as usize] as char);
    }
    out
}

/// Decode base58 text back into bytes.
///
/// Each leading `'1'` yields one leading zero byte.
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    let zeros = input.bytes().take_while(|&b| b == ALPHABET[0]).count();

    // Little-endian base-256 bytes of the non-zero tail.
    let mut bytes: Vec<u8> = Vec::with_capacity(input.len());
    for (index, ch) in input.chars().enumerate().skip(zeros) {
        let value = digit_value(ch).ok_or(DecodeError::InvalidCharacter { ch, index })?;
        let mut carry = value as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; zeros];
    out.extend(bytes.iter().rev());
    Ok(out)
}

fn digit_value(ch: char) -> Option<u8> {
    if !ch.is_ascii() {
        return None;
    }
    ALPHABET
        .iter()
        .position(|&a| a == ch as u8)
        .map(|pos| pos as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(encode(&[]), "");
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_all_zero_bytes_become_zero_symbols() {
        for len in 1..=8 {
            let encoded = encode(&vec![0u8; len]);
            assert_eq!(encoded, "1".repeat(len));
        }
    }

    #[test]
    fn test_single_byte_0x3a() {
        // 58 = 1 * 58 + 0
        let encoded = encode(&[0x3A]);
        assert_eq!(encoded, "21");
        assert!(!encoded.starts_with('1'));
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(encode(b"hello world"), "StV1DL6CwTryKyV");
        assert_eq!(encode(&[0x00, 0x00, 0x28, 0x7f, 0xb4, 0xcd]), "11233QC4");
        assert_eq!(encode(&[0xff]), "5Q");
    }

    #[test]
    fn test_leading_zeros_preserved_not_collapsed() {
        let encoded = encode(&[0, 0, 0, 1]);
        assert_eq!(encoded, "1112");
    }

    #[test]
    fn test_system_program_id() {
        assert_eq!(encode(&[0u8; 32]), "11111111111111111111111111111111");
    }

    #[test]
    fn test_decode_inverts_encode() {
        let data = [0u8, 7, 200, 13, 0, 255, 42];
        assert_eq!(decode(&encode(&data)).unwrap(), data);
        assert_eq!(decode("StV1DL6CwTryKyV").unwrap(), b"hello world");
    }

    #[test]
    fn test_decode_rejects_ambiguous_characters() {
        for bad in ["0", "O", "I", "l"] {
            let input = format!("abc{bad}");
            assert_eq!(
                decode(&input),
                Err(DecodeError::InvalidCharacter {
                    ch: bad.chars().next().unwrap(),
                    index: 3
                })
            );
        }
    }

    #[test]
    fn test_encoding_uses_only_alphabet() {
        let data: Vec<u8> = (0..=255u8).collect();
        let encoded = encode(&data);
        assert!(encoded.bytes().all(|b| ALPHABET.contains(&b)));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;
        use proptest::prelude::prop;

        proptest! {
            #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

            #[test]
            fn decode_inverts_encode(data in prop::collection::vec(any::<u8>(), 0..96)) {
                prop_assert_eq!(decode(&encode(&data)).unwrap(), data);
            }

            #[test]
            fn leading_zero_bytes_map_to_leading_ones(
                zeros in 0usize..8,
                tail in prop::collection::vec(1u8..=255, 0..32),
            ) {
                let mut data = vec![0u8; zeros];
                data.extend_from_slice(&tail);
                let encoded = encode(&data);
                let ones = encoded.bytes().take_while(|&b| b == b'1').count();
                prop_assert_eq!(ones, zeros);
            }
        }
    }
}
