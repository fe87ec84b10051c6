//! The decoded message and the `parse`/`build` operations that move
//! between it and the wire.

use std::collections::HashMap;

use crate::bitmap;
use crate::error::{BuildError, ParseError};
use crate::field::{self, FieldValue};
use crate::schema::{self, Network, Version};
use crate::tlv::{self, TlvEntry};
use crate::validate::{self, ValidationDiagnostic};

/// Field number of the ICC data field, carrying EMV TLV.
const EMV_FIELD: u8 = 55;
/// Field number of the primary account number, used for network detection.
const PAN_FIELD: u8 = 2;

/// A decoded ISO 8583 message: the MTI, the field map, and (if field
/// 55 was present) its EMV TLV entries in encounter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub mti: String,
    pub fields: HashMap<u8, FieldValue>,
    pub version: Version,
    pub network: Option<Network>,
    /// Whether `network` was supplied by the caller, as opposed to
    /// auto-detected from field 2. Only a caller-supplied network
    /// triggers the required-field-set check in `validate` (see
    /// `DESIGN.md`'s Open Question resolution) — detection alone
    /// infers a likely scheme, it does not assert the message
    /// actually follows that scheme's required-field contract.
    pub network_supplied: bool,
    /// The hex-encoded presence bitmap: recovered verbatim (upper-cased)
    /// from the wire on parse, or derived from the field map by
    /// `MessageBuilder::build`. Empty for a freshly constructed message
    /// that hasn't gone through either path yet.
    pub bitmap: String,
    /// Original wire bytes when parsed; empty when built programmatically.
    pub raw: Vec<u8>,
    emv: Vec<TlvEntry>,
    emv_index: HashMap<String, usize>,
}

impl Message {
    pub fn new(mti: impl Into<String>, version: Version) -> Self {
        Message {
            mti: mti.into(),
            fields: HashMap::new(),
            version,
            network: None,
            network_supplied: false,
            bitmap: String::new(),
            raw: Vec::new(),
            emv: Vec::new(),
            emv_index: HashMap::new(),
        }
    }

    /// Field 0 is not a data field (invariant 5 in `spec.md` §3): it is
    /// the legacy slot for the MTI when callers choose to mirror it
    /// into the field map. `field`/`set_field` route 0 through `mti`
    /// directly so emission (`present_field_numbers`) never sees it.
    pub fn field(&self, number: u8) -> Option<&FieldValue> {
        if number == 0 {
            return None;
        }
        self.fields.get(&number)
    }

    pub fn set_field(&mut self, number: u8, value: FieldValue) {
        if number == 0 {
            if let FieldValue::Text(s) = value {
                self.mti = s;
            }
            return;
        }
        self.fields.insert(number, value);
    }

    pub fn remove_field(&mut self, number: u8) -> Option<FieldValue> {
        if number == 0 {
            return None;
        }
        self.fields.remove(&number)
    }

    /// Reset to an empty `0000` message, for reuse by [`crate::pool::MessagePool`].
    pub fn clear(&mut self) {
        self.mti.clear();
        self.mti.push_str("0000");
        self.fields.clear();
        self.network = None;
        self.network_supplied = false;
        self.bitmap.clear();
        self.raw.clear();
        self.emv.clear();
        self.emv_index.clear();
    }

    /// EMV TLV entries in encounter order.
    pub fn emv_entries(&self) -> &[TlvEntry] {
        &self.emv
    }

    /// Look up an EMV tag's value by its hex tag string, O(1).
    pub fn emv_tag(&self, tag: &str) -> Option<&[u8]> {
        self.emv_index.get(tag).map(|&i| self.emv[i].1.as_slice())
    }

    fn set_emv(&mut self, entries: Vec<TlvEntry>) {
        self.emv_index = entries
            .iter()
            .enumerate()
            .map(|(i, (tag, _))| (tag.clone(), i))
            .collect();
        self.emv = entries;
    }

    fn present_field_numbers(&self) -> Vec<u8> {
        let mut nums: Vec<u8> = self
            .fields
            .keys()
            .copied()
            .filter(|&n| n != 0 && n != 1 && n != 65)
            .collect();
        nums.sort_unstable();
        nums
    }
}

/// A fluent constructor for a [`Message`], mirroring a builder style
/// common in the reference ISO 8583 crates.
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn new(mti: impl Into<String>) -> Self {
        MessageBuilder {
            message: Message::new(mti, Version::default()),
        }
    }

    pub fn version(mut self, version: Version) -> Self {
        self.message.version = version;
        self
    }

    pub fn network(mut self, network: Network) -> Self {
        self.message.network = Some(network);
        self.message.network_supplied = true;
        self
    }

    pub fn field(mut self, number: u8, value: FieldValue) -> Self {
        self.message.set_field(number, value);
        self
    }

    pub fn text_field(self, number: u8, value: impl Into<String>) -> Self {
        self.field(number, FieldValue::Text(value.into()))
    }

    pub fn emv(mut self, entries: Vec<TlvEntry>) -> Self {
        self.message.set_emv(entries);
        self
    }

    /// Validate and return the message, or every diagnostic at once.
    pub fn build(mut self) -> Result<Message, Vec<ValidationDiagnostic>> {
        let diagnostics = validate::validate(&self.message);
        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }
        let present = self.message.present_field_numbers();
        self.message.bitmap = bitmap::encode(present);
        Ok(self.message)
    }
}

/// Parse a wire message. `network` overrides automatic detection from
/// field 2; pass `None` to detect from the PAN when present.
pub fn parse(input: &[u8], version: Version, network: Option<Network>) -> Result<Message, ParseError> {
    if input.len() < 4 {
        return Err(ParseError::TruncatedMti(input.len()));
    }
    let mti_str = std::str::from_utf8(&input[0..4])
        .map_err(|_| ParseError::InvalidMti(String::from_utf8_lossy(&input[0..4]).to_string()))?;
    if mti_str.len() != 4 || !mti_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidMti(mti_str.to_string()));
    }
    let mut cursor = 4usize;

    if input.len() < cursor + 16 {
        return Err(ParseError::InvalidBitmap(format!(
            "need at least 16 hex characters for the primary bitmap, have {}",
            input.len() - cursor
        )));
    }
    let primary_hex = std::str::from_utf8(&input[cursor..cursor + 16])
        .map_err(|_| ParseError::InvalidBitmap("primary bitmap is not valid ASCII".to_string()))?;
    let has_secondary = {
        let value = u64::from_str_radix(primary_hex, 16)
            .map_err(|_| ParseError::InvalidBitmap(format!("not valid hex: {primary_hex:?}")))?;
        value & (1u64 << 63) != 0
    };
    let bitmap_len = if has_secondary { 32 } else { 16 };
    if input.len() < cursor + bitmap_len {
        return Err(ParseError::InvalidBitmap(format!(
            "need {bitmap_len} hex characters for the bitmap, have {}",
            input.len() - cursor
        )));
    }
    let bitmap_hex = std::str::from_utf8(&input[cursor..cursor + bitmap_len])
        .map_err(|_| ParseError::InvalidBitmap("bitmap is not valid ASCII".to_string()))?;
    let present = bitmap::present_fields(bitmap_hex)?;
    cursor += bitmap_len;

    let mut message = Message::new(mti_str.to_string(), version);
    message.network = network;
    message.network_supplied = network.is_some();
    message.bitmap = bitmap_hex.to_uppercase();

    for &field_num in &present {
        let def = schema::definition_of(field_num, version, message.network)
            .ok_or(ParseError::UnknownField(field_num as u16))?;
        let value = field::decode(field_num as u16, &def, input, &mut cursor)?;

        if field_num == PAN_FIELD && message.network.is_none() {
            if let FieldValue::Text(pan) = &value {
                message.network = schema::detect_network(pan);
            }
        }

        if field_num == EMV_FIELD {
            if let FieldValue::Binary(bytes) = &value {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                let entries = tlv::parse_emv(&hex).map_err(|e| ParseError::InvalidCharClass {
                    field: EMV_FIELD as u16,
                    reason: e.to_string(),
                })?;
                message.set_emv(entries);
            }
        }

        message.set_field(field_num, value);
    }

    if cursor != input.len() {
        return Err(ParseError::TrailingGarbage(input.len() - cursor));
    }

    message.raw = input.to_vec();
    Ok(message)
}

/// Validate, then serialize a message to the wire. Fields are emitted
/// in ascending field-number order; the bitmap is derived from the
/// field set actually present, never trusted from caller state.
pub fn build(message: &Message) -> Result<Vec<u8>, BuildError> {
    let diagnostics = validate::validate(message);
    if !diagnostics.is_empty() {
        return Err(BuildError { diagnostics });
    }

    let mut out = Vec::new();
    out.extend_from_slice(message.mti.as_bytes());

    let present = message.present_field_numbers();
    out.extend_from_slice(bitmap::encode(present.iter().copied()).as_bytes());

    for &field_num in &present {
        let def = schema::definition_of(field_num, message.version, message.network).ok_or_else(|| BuildError {
            diagnostics: vec![ValidationDiagnostic::unknown_field(field_num)],
        })?;
        let value = message.field(field_num).expect("present_field_numbers lists only set fields");
        let encoded = field::encode(field_num as u16, &def, value).map_err(|err| BuildError {
            diagnostics: vec![ValidationDiagnostic::from_encode_error(field_num, &err)],
        })?;
        out.extend_from_slice(&encoded);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes() -> Vec<u8> {
        // MTI 0200, bitmap for fields 2,3,4,11,41,42,49
        let mti = "0200";
        let present = [2u8, 3, 4, 11, 41, 42, 49];
        let bitmap_hex = bitmap::encode(present.iter().copied());
        let mut s = format!("{mti}{bitmap_hex}");
        s.push_str("164111111111111111"); // field 2
        s.push_str("000000"); // field 3
        s.push_str("000000010000"); // field 4
        s.push_str("000042"); // field 11
        s.push_str("TERM0001"); // field 41
        s.push_str("MERCHANT123456 "); // field 42
        s.push_str("840"); // field 49
        s.into_bytes()
    }

    #[test]
    fn parse_sample_message() {
        let bytes = sample_bytes();
        let message = parse(&bytes, Version::V1987, None).unwrap();
        assert_eq!(message.mti, "0200");
        assert_eq!(message.field(2), Some(&FieldValue::Text("4111111111111111".to_string())));
        assert_eq!(message.network, Some(Network::Visa));
        assert_eq!(message.bitmap, std::str::from_utf8(&bytes[4..20]).unwrap());
    }

    #[test]
    fn builder_derives_bitmap_matching_present_fields() {
        let message = MessageBuilder::new("0200")
            .text_field(2, "4111111111111111")
            .text_field(3, "000000")
            .text_field(4, "000000010000")
            .text_field(11, "42")
            .build()
            .unwrap();
        assert_eq!(message.bitmap, bitmap::encode([2u8, 3, 4, 11]));

        let wire = build(&message).unwrap();
        let reparsed = parse(&wire, Version::V1987, None).unwrap();
        assert_eq!(reparsed.bitmap, message.bitmap);
    }

    #[test]
    fn parse_rejects_trailing_garbage() {
        let mut bytes = sample_bytes();
        bytes.extend_from_slice(b"XYZ");
        let err = parse(&bytes, Version::V1987, None).unwrap_err();
        assert!(matches!(err, ParseError::TrailingGarbage(3)));
    }

    #[test]
    fn parse_rejects_short_mti() {
        let err = parse(b"020", Version::V1987, None).unwrap_err();
        assert!(matches!(err, ParseError::TruncatedMti(3)));
    }

    #[test]
    fn parse_rejects_non_numeric_mti() {
        let mut bytes = sample_bytes();
        bytes[0] = b'X';
        let err = parse(&bytes, Version::V1987, None).unwrap_err();
        assert!(matches!(err, ParseError::InvalidMti(_)));
    }

    #[test]
    fn round_trip_build_then_parse() {
        let message = MessageBuilder::new("0200")
            .network(Network::Visa)
            .text_field(2, "4111111111111111")
            .text_field(3, "000000")
            .text_field(4, "000000010000")
            .text_field(11, "42")
            .text_field(14, "2512")
            .text_field(22, "012")
            .text_field(24, "200")
            .text_field(25, "00")
            .build()
            .unwrap();

        let wire = build(&message).unwrap();
        let reparsed = parse(&wire, Version::V1987, Some(Network::Visa)).unwrap();
        assert_eq!(reparsed.mti, "0200");
        assert_eq!(reparsed.field(2), message.field(2));
        assert_eq!(reparsed.field(4), message.field(4));
    }

    #[test]
    fn build_refuses_on_missing_required_field() {
        let mut message = Message::new("0200", Version::V1987);
        message.network = Some(Network::Visa);
        message.network_supplied = true;
        let err = build(&message).unwrap_err();
        assert!(!err.diagnostics.is_empty());
    }

    #[test]
    fn emv_round_trip_via_field_55() {
        let tlv_hex = "9F2608123456789ABCDEF09F2701809F10080110A00003220000";
        let entries = tlv::parse_emv(tlv_hex).unwrap();
        let blob_len = tlv_hex.len() / 2;
        let message = MessageBuilder::new("0100")
            .network(Network::Visa)
            .text_field(2, "4111111111111111")
            .text_field(3, "000000")
            .text_field(4, "000000010000")
            .text_field(11, "42")
            .text_field(14, "2512")
            .text_field(22, "012")
            .text_field(24, "200")
            .text_field(25, "00")
            .field(55, FieldValue::Binary(hex_to_bytes(tlv_hex)))
            .emv(entries.clone())
            .build()
            .unwrap();
        assert_eq!(blob_len, message.field(55).unwrap().as_binary().unwrap().len());

        let wire = build(&message).unwrap();
        let reparsed = parse(&wire, Version::V1987, Some(Network::Visa)).unwrap();
        assert_eq!(reparsed.emv_entries(), entries.as_slice());
        assert_eq!(reparsed.emv_tag("9F26"), Some([0x12u8, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0].as_slice()));
    }

    fn hex_to_bytes(hex: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(hex.len() / 2);
        let b = hex.as_bytes();
        let mut i = 0;
        while i < b.len() {
            let byte = u8::from_str_radix(&hex[i..i + 2], 16).unwrap();
            out.push(byte);
            i += 2;
        }
        out
    }
}
