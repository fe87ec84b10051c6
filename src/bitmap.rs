//! Presence bitmap codec: the 64- or 128-bit vector indicating which
//! of fields 1-128 are present, transmitted as 16 or 32 ASCII hex
//! characters (big-endian, 1-based bit numbering).

use crate::error::ParseError;

/// Bit numbering is 1-based and big-endian: bit `n` (1 <= n <= 64) of
/// the primary bitmap is mask `1 << (64 - n)`; bits 65-128 live in the
/// secondary bitmap with the same mapping, offset by 64.
fn mask_for(field: u8) -> (bool, u64) {
    if field <= 64 {
        (false, 1u64 << (64 - field as u32))
    } else {
        (true, 1u64 << (64 - (field - 64) as u32))
    }
}

fn parse_half(hex: &str) -> Result<u64, ParseError> {
    if hex.len() != 16 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidBitmap(format!(
            "expected 16 hex characters, got {:?}",
            hex
        )));
    }
    u64::from_str_radix(hex, 16)
        .map_err(|e| ParseError::InvalidBitmap(format!("not valid hex: {e}")))
}

/// Ordered list of field numbers present in `bitmap_hex` (16 or 32 hex
/// characters), excluding the continuation bits themselves (1 and 65).
pub fn present_fields(bitmap_hex: &str) -> Result<Vec<u8>, ParseError> {
    if bitmap_hex.len() != 16 && bitmap_hex.len() != 32 {
        return Err(ParseError::InvalidBitmap(format!(
            "expected 16 or 32 hex characters, got {} characters",
            bitmap_hex.len()
        )));
    }
    let primary = parse_half(&bitmap_hex[0..16])?;
    let has_secondary = primary & mask_for(1).1 != 0;
    if has_secondary && bitmap_hex.len() != 32 {
        return Err(ParseError::InvalidBitmap(
            "bit 1 set but no secondary bitmap supplied".to_string(),
        ));
    }
    let secondary = if bitmap_hex.len() == 32 {
        Some(parse_half(&bitmap_hex[16..32])?)
    } else {
        None
    };

    let mut fields = Vec::new();
    for n in 2u8..=64 {
        let (_, mask) = mask_for(n);
        if primary & mask != 0 {
            fields.push(n);
        }
    }
    if let Some(secondary) = secondary {
        for n in 66u8..=128 {
            let (_, mask) = mask_for(n);
            if secondary & mask != 0 {
                fields.push(n);
            }
        }
    }
    Ok(fields)
}

/// Encode the set of present field numbers into a bitmap hex string.
/// Sets bit 1 iff any field in `[65, 128]` is present (excluding the
/// marker field 65 itself); returns 16 hex characters if no secondary
/// bitmap is needed, 32 otherwise. Output is always upper-case.
pub fn encode<I: IntoIterator<Item = u8>>(present: I) -> String {
    let mut primary = 0u64;
    let mut secondary = 0u64;
    let mut needs_secondary = false;

    for field in present {
        if field == 0 || field == 1 || field == 65 {
            continue;
        }
        let (is_secondary, mask) = mask_for(field);
        if is_secondary {
            secondary |= mask;
            needs_secondary = true;
        } else {
            primary |= mask;
        }
    }

    if needs_secondary {
        primary |= mask_for(1).1;
        format!("{:016X}{:016X}", primary, secondary)
    } else {
        format!("{:016X}", primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_fields_simple() {
        let hex = encode([2, 3, 4, 11, 41, 42]);
        assert_eq!(hex.len(), 16);
        let fields = present_fields(&hex).unwrap();
        assert_eq!(fields, vec![2, 3, 4, 11, 41, 42]);
    }

    #[test]
    fn encode_sets_bit_one_for_secondary() {
        let hex = encode([2, 3, 128]);
        assert_eq!(hex.len(), 32);
        assert!(hex.starts_with('8') || u64::from_str_radix(&hex[0..16], 16).unwrap() & (1u64 << 63) != 0);
        let fields = present_fields(&hex).unwrap();
        assert_eq!(fields, vec![2, 3, 128]);
    }

    #[test]
    fn no_secondary_bitmap_stays_16_chars() {
        let hex = encode([2, 3, 4]);
        assert_eq!(hex.len(), 16);
    }

    #[test]
    fn invalid_hex_rejected() {
        assert!(present_fields("ZZZZZZZZZZZZZZZZ").is_err());
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(present_fields("1234").is_err());
        assert!(present_fields("1234567890ABCDE").is_err());
    }

    #[test]
    fn bit1_set_without_secondary_is_error() {
        // Primary alone claiming a secondary bitmap follows.
        assert!(present_fields("8000000000000000").is_err());
    }

    #[test]
    fn round_trip_many_fields() {
        let fields: Vec<u8> = (2..=64).chain(66..=128).step_by(3).collect();
        let hex = encode(fields.iter().copied());
        let recovered = present_fields(&hex).unwrap();
        assert_eq!(recovered, fields);
    }

    #[test]
    fn upper_case_output() {
        let hex = encode([2]);
        assert_eq!(hex, hex.to_uppercase());
    }

    #[test]
    fn case_insensitive_on_parse() {
        let upper = encode([2, 3]);
        let lower = upper.to_lowercase();
        assert_eq!(present_fields(&lower).unwrap(), present_fields(&upper).unwrap());
    }
}
