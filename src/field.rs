//! Per-field encode/decode, parameterized by a [`crate::schema::FieldDefinition`].
//!
//! A field's definition fixes its length encoding (fixed / LLVAR /
//! LLLVAR) and its character class. Binary fields are hex-encoded on
//! the wire like everything else (see the "Binary versus text wire"
//! design note): `max_length`/`min_length` count *bytes* of the
//! decoded value, so a binary field's wire span is twice that many
//! hex characters.

use crate::error::{EncodeError, ParseError};
use crate::schema::{DataType, FieldDefinition, LengthType, PaddingDirection};

/// A decoded field value: text for numeric/alpha/alphanumeric/track2
/// types, a byte sequence for binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Binary(Vec<u8>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Binary(_) => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Binary(b) => Some(b),
            FieldValue::Text(_) => None,
        }
    }

    /// Length of the value in its own unit: characters for text,
    /// bytes for binary.
    pub fn unit_len(&self) -> usize {
        match self {
            FieldValue::Text(s) => s.chars().count(),
            FieldValue::Binary(b) => b.len(),
        }
    }
}

/// True if `c` belongs to `data_type`'s character class.
pub fn char_allowed(data_type: DataType, c: char) -> bool {
    match data_type {
        DataType::Numeric => c.is_ascii_digit(),
        DataType::Alpha => c.is_ascii_alphabetic(),
        DataType::Alphanumeric => c.is_ascii_alphanumeric(),
        DataType::AlphanumericSpecial => c.is_ascii() && !c.is_ascii_control(),
        DataType::Track2 => c.is_ascii_digit() || c == '=' || c == 'D',
        DataType::Binary => c.is_ascii_hexdigit(),
    }
}

/// Check that every character of `s` belongs to `data_type`'s class.
/// For `Binary`, also requires an even count (hex-encoded bytes).
pub fn check_char_class(data_type: DataType, s: &str) -> Result<(), String> {
    if matches!(data_type, DataType::Binary) && s.len() % 2 != 0 {
        return Err(format!("odd-length hex value {s:?}"));
    }
    for c in s.chars() {
        if !char_allowed(data_type, c) {
            return Err(format!("character {c:?} not valid for this field's type"));
        }
    }
    Ok(())
}

fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err(format!("odd-length hex value {s:?}"));
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let hi = (bytes[i] as char).to_digit(16).ok_or_else(|| format!("invalid hex in {s:?}"))?;
        let lo = (bytes[i + 1] as char)
            .to_digit(16)
            .ok_or_else(|| format!("invalid hex in {s:?}"))?;
        out.push(((hi << 4) | lo) as u8);
        i += 2;
    }
    Ok(out)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02X}", b));
    }
    s
}

fn length_prefix_width(length_type: LengthType) -> usize {
    match length_type {
        LengthType::Fixed => 0,
        LengthType::Llvar => 2,
        LengthType::Lllvar => 3,
    }
}

/// Decode one field starting at `input[*cursor..]`, advancing `*cursor`
/// past the consumed bytes.
pub fn decode(field: u16, def: &FieldDefinition, input: &[u8], cursor: &mut usize) -> Result<FieldValue, ParseError> {
    let remaining = &input[*cursor..];
    let as_str = |bytes: &[u8]| -> Result<&str, ParseError> {
        std::str::from_utf8(bytes).map_err(|e| ParseError::InvalidCharClass {
            field,
            reason: format!("not valid ASCII/UTF-8: {e}"),
        })
    };

    match def.length_type {
        LengthType::Fixed => {
            let char_span = if def.data_type == DataType::Binary {
                def.max_length as usize * 2
            } else {
                def.max_length as usize
            };
            if remaining.len() < char_span {
                return Err(ParseError::InvalidLength {
                    field,
                    reason: format!("need {char_span} bytes, have {}", remaining.len()),
                });
            }
            let slice = as_str(&remaining[..char_span])?;
            check_char_class(def.data_type, slice).map_err(|reason| ParseError::InvalidCharClass { field, reason })?;
            *cursor += char_span;
            if def.data_type == DataType::Binary {
                Ok(FieldValue::Binary(hex_decode(slice).map_err(|reason| ParseError::InvalidCharClass { field, reason })?))
            } else {
                Ok(FieldValue::Text(slice.to_string()))
            }
        }
        LengthType::Llvar | LengthType::Lllvar => {
            let width = length_prefix_width(def.length_type);
            if remaining.len() < width {
                return Err(ParseError::InvalidLength {
                    field,
                    reason: format!("need {width} length digits, have {}", remaining.len()),
                });
            }
            let len_str = as_str(&remaining[..width])?;
            if !len_str.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseError::InvalidLength {
                    field,
                    reason: format!("length prefix {len_str:?} is not decimal"),
                });
            }
            let char_len: usize = len_str.parse().expect("validated decimal above");

            let (unit_len, max_units, min_units) = if def.data_type == DataType::Binary {
                if char_len % 2 != 0 {
                    return Err(ParseError::InvalidLength {
                        field,
                        reason: format!("binary field length {char_len} is odd"),
                    });
                }
                (char_len / 2, def.max_length as usize, def.min_length as usize)
            } else {
                (char_len, def.max_length as usize, def.min_length as usize)
            };
            if unit_len > max_units {
                return Err(ParseError::InvalidLength {
                    field,
                    reason: format!("length {unit_len} exceeds max {max_units}"),
                });
            }
            if unit_len < min_units {
                return Err(ParseError::InvalidLength {
                    field,
                    reason: format!("length {unit_len} below min {min_units}"),
                });
            }
            if remaining.len() < width + char_len {
                return Err(ParseError::InvalidLength {
                    field,
                    reason: format!("truncated payload: need {char_len}, have {}", remaining.len() - width),
                });
            }
            let payload = as_str(&remaining[width..width + char_len])?;
            check_char_class(def.data_type, payload).map_err(|reason| ParseError::InvalidCharClass { field, reason })?;
            *cursor += width + char_len;
            if def.data_type == DataType::Binary {
                Ok(FieldValue::Binary(hex_decode(payload).map_err(|reason| ParseError::InvalidCharClass { field, reason })?))
            } else {
                Ok(FieldValue::Text(payload.to_string()))
            }
        }
    }
}

/// Encode one field's value per its definition, appending to `out`.
pub fn encode(field: u16, def: &FieldDefinition, value: &FieldValue) -> Result<Vec<u8>, EncodeError> {
    match def.length_type {
        LengthType::Fixed => {
            let body = match (def.data_type, value) {
                (DataType::Binary, FieldValue::Binary(bytes)) => {
                    if bytes.len() != def.max_length as usize {
                        return if bytes.len() > def.max_length as usize {
                            Err(EncodeError::ValueTooLong { field, len: bytes.len(), max: def.max_length as usize })
                        } else {
                            Err(EncodeError::ValueTooShort { field, len: bytes.len(), min: def.max_length as usize })
                        };
                    }
                    hex_encode(bytes)
                }
                (_, FieldValue::Text(s)) => pad_fixed(def, s)?,
                _ => {
                    return Err(EncodeError::ValueTooLong { field, len: 0, max: def.max_length as usize });
                }
            };
            Ok(body.into_bytes())
        }
        LengthType::Llvar | LengthType::Lllvar => {
            let width = length_prefix_width(def.length_type);
            let (char_len, payload) = match (def.data_type, value) {
                (DataType::Binary, FieldValue::Binary(bytes)) => {
                    if bytes.len() > def.max_length as usize {
                        return Err(EncodeError::ValueTooLong { field, len: bytes.len(), max: def.max_length as usize });
                    }
                    if bytes.len() < def.min_length as usize {
                        return Err(EncodeError::ValueTooShort { field, len: bytes.len(), min: def.min_length as usize });
                    }
                    let hex = hex_encode(bytes);
                    (hex.len(), hex)
                }
                (_, FieldValue::Text(s)) => {
                    let len = s.chars().count();
                    if len > def.max_length as usize {
                        return Err(EncodeError::ValueTooLong { field, len, max: def.max_length as usize });
                    }
                    if len < def.min_length as usize {
                        return Err(EncodeError::ValueTooShort { field, len, min: def.min_length as usize });
                    }
                    (len, s.clone())
                }
                _ => return Err(EncodeError::ValueTooLong { field, len: 0, max: def.max_length as usize }),
            };
            // `char_len` counts wire characters (hex digits for binary, so
            // up to 2x `def.max_length`), not the byte/char count already
            // checked against `def.max_length` above; it must still fit the
            // length prefix's own digit width or the prefix itself would be
            // wrong-width and the body misaligned on decode.
            let prefix_max = 10usize.pow(width as u32) - 1;
            if char_len > prefix_max {
                return Err(EncodeError::ValueTooLong { field, len: char_len, max: prefix_max });
            }
            let mut out = format!("{:0width$}", char_len, width = width);
            out.push_str(&payload);
            Ok(out.into_bytes())
        }
    }
}

fn pad_fixed(def: &FieldDefinition, s: &str) -> Result<String, EncodeError> {
    let len = s.chars().count();
    let max = def.max_length as usize;
    if len > max {
        return Err(EncodeError::ValueTooLong { field: 0, len, max });
    }
    if len == max {
        return Ok(s.to_string());
    }
    let pad_count = max - len;
    let pad_char = def.padding_char as char;
    let padding: String = std::iter::repeat(pad_char).take(pad_count).collect();
    Ok(match def.padding_direction {
        PaddingDirection::Left => format!("{padding}{s}"),
        PaddingDirection::Right => format!("{s}{padding}"),
        PaddingDirection::None => s.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{definition_of, Version};

    fn def(field: u8) -> FieldDefinition {
        definition_of(field, Version::V1987, None).unwrap()
    }

    #[test]
    fn decode_fixed_numeric_left_padded() {
        let d = def(4); // transaction amount, fixed 12, numeric
        let wire = b"000000010000";
        let mut cursor = 0;
        let v = decode(4, &d, wire, &mut cursor).unwrap();
        assert_eq!(v, FieldValue::Text("000000010000".to_string()));
        assert_eq!(cursor, 12);
    }

    #[test]
    fn encode_fixed_numeric_pads_left_with_zero() {
        let d = def(11); // STAN, fixed 6, numeric
        let bytes = encode(11, &d, &FieldValue::Text("42".to_string())).unwrap();
        assert_eq!(bytes, b"000042");
    }

    #[test]
    fn encode_fixed_alpha_pads_right_with_space() {
        let d = def(42); // card acceptor id, fixed 15, ans
        let bytes = encode(42, &d, &FieldValue::Text("MERCHANT123456".to_string())).unwrap();
        assert_eq!(bytes, b"MERCHANT123456 ");
    }

    #[test]
    fn encode_fixed_too_long_is_error() {
        let d = def(11);
        let err = encode(11, &d, &FieldValue::Text("1234567".to_string())).unwrap_err();
        assert!(matches!(err, EncodeError::ValueTooLong { .. }));
    }

    #[test]
    fn decode_llvar_pan() {
        let d = def(2);
        let wire = b"164111111111111111";
        let mut cursor = 0;
        let v = decode(2, &d, wire, &mut cursor).unwrap();
        assert_eq!(v, FieldValue::Text("4111111111111111".to_string()));
        assert_eq!(cursor, wire.len());
    }

    #[test]
    fn decode_llvar_bad_length_digits_errors() {
        let d = def(2);
        let wire = b"XX4111111111111111";
        let mut cursor = 0;
        assert!(decode(2, &d, wire, &mut cursor).is_err());
    }

    #[test]
    fn decode_llvar_over_max_errors() {
        let d = def(2); // max 19
        let wire = b"204111111111111111111111"; // claims length 20
        let mut cursor = 0;
        assert!(decode(2, &d, wire, &mut cursor).is_err());
    }

    #[test]
    fn decode_llvar_truncated_payload_errors() {
        let d = def(2);
        let wire = b"1641111111"; // claims 16 chars, only 10 available
        let mut cursor = 0;
        assert!(decode(2, &d, wire, &mut cursor).is_err());
    }

    #[test]
    fn encode_llvar_zero_pads_length_prefix() {
        let d = def(2);
        let bytes = encode(2, &d, &FieldValue::Text("4111".to_string())).unwrap();
        assert_eq!(bytes, b"044111");
    }

    #[test]
    fn round_trip_lllvar() {
        let d = def(54); // additional amounts, lllvar 120, ans
        let value = FieldValue::Text("USD100.00".to_string());
        let encoded = encode(54, &d, &value).unwrap();
        let mut cursor = 0;
        let decoded = decode(54, &d, &encoded, &mut cursor).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(cursor, encoded.len());
    }

    #[test]
    fn binary_field_round_trips_hex() {
        let d = def(52); // PIN data, fixed binary 16 bytes -> 32 hex chars
        let value = FieldValue::Binary(vec![0xAB; 16]);
        let encoded = encode(52, &d, &value).unwrap();
        assert_eq!(encoded.len(), 32);
        let mut cursor = 0;
        let decoded = decode(52, &d, &encoded, &mut cursor).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn binary_variable_length_round_trips() {
        let d = def(55); // ICC data, lllvar binary max 999 bytes
        let value = FieldValue::Binary(vec![0x9F, 0x26, 0x08, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
        let encoded = encode(55, &d, &value).unwrap();
        // length prefix counts hex characters, not bytes.
        assert_eq!(&encoded[..3], b"020");
        let mut cursor = 0;
        let decoded = decode(55, &d, &encoded, &mut cursor).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn binary_variable_length_rejects_prefix_overflow() {
        let d = def(55); // lllvar binary, max_length = 999 *bytes* but a
                          // 3-digit prefix counts hex characters (2x bytes)
        let value = FieldValue::Binary(vec![0xAB; 500]); // 500 bytes within max_length,
                                                           // but 1000 hex chars overflows "999"
        let err = encode(55, &d, &value).unwrap_err();
        assert!(matches!(err, EncodeError::ValueTooLong { .. }));
    }

    #[test]
    fn binary_variable_length_at_prefix_boundary_succeeds() {
        let d = def(55);
        let value = FieldValue::Binary(vec![0xAB; 499]); // 998 hex chars, fits in "999"
        let encoded = encode(55, &d, &value).unwrap();
        assert_eq!(&encoded[..3], b"998");
        let mut cursor = 0;
        let decoded = decode(55, &d, &encoded, &mut cursor).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn decode_does_not_strip_padding() {
        let d = def(42);
        let wire = b"MERCHANT123456 "; // already right-padded
        let mut cursor = 0;
        let v = decode(42, &d, wire, &mut cursor).unwrap();
        assert_eq!(v, FieldValue::Text("MERCHANT123456 ".to_string()));
    }

    #[test]
    fn invalid_char_class_rejected() {
        let d = def(4); // numeric
        let wire = b"00000001000A";
        let mut cursor = 0;
        assert!(decode(4, &d, wire, &mut cursor).is_err());
    }
}
