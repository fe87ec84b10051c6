//! Validation: collects every problem with a message into a
//! `Vec<ValidationDiagnostic>` instead of failing on the first one, so
//! a caller sees the whole picture in a single pass.

use crate::error::EncodeError;
use crate::field::{self, FieldValue};
use crate::message::Message;
use crate::schema;

/// Which rule (spec.md §4.7) a diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationRule {
    MtiShape,
    BitmapConsistency,
    CharacterClass,
    Length,
    PanLuhn,
    RequiredField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub field: Option<u8>,
    pub rule: ValidationRule,
    pub message: String,
}

impl ValidationDiagnostic {
    fn new(rule: ValidationRule, field: Option<u8>, message: impl Into<String>) -> Self {
        ValidationDiagnostic { field, rule, message: message.into() }
    }

    pub(crate) fn unknown_field(field_num: u8) -> Self {
        ValidationDiagnostic::new(
            ValidationRule::CharacterClass,
            Some(field_num),
            format!("field {field_num} has no schema definition for this version/network"),
        )
    }

    pub(crate) fn from_encode_error(field_num: u8, err: &EncodeError) -> Self {
        ValidationDiagnostic::new(ValidationRule::Length, Some(field_num), err.to_string())
    }
}

impl std::fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.field {
            Some(n) => write!(f, "[{:?}] field {n}: {}", self.rule, self.message),
            None => write!(f, "[{:?}] {}", self.rule, self.message),
        }
    }
}

/// Run every rule against `message`, returning all diagnostics found.
/// An empty result means the message is fit to build.
pub fn validate(message: &Message) -> Vec<ValidationDiagnostic> {
    let mut out = Vec::new();
    check_mti_shape(message, &mut out);
    check_bitmap_consistency(message, &mut out);
    check_fields(message, &mut out);
    check_pan_luhn(message, &mut out);
    check_required_fields(message, &mut out);
    out
}

/// Exactly four decimal digits; first digit (version) in `{0,1,2}`;
/// second digit (message class) in `{1,2,3,4,5,6,8,9}` — 7 and 0 are
/// invalid. The third and fourth digits carry domain meaning
/// (function code, origin) this codec does not enforce (`spec.md` §4.7
/// rule 1).
fn check_mti_shape(message: &Message, out: &mut Vec<ValidationDiagnostic>) {
    let mti = &message.mti;
    if mti.len() != 4 || !mti.bytes().all(|b| b.is_ascii_digit()) {
        out.push(ValidationDiagnostic::new(
            ValidationRule::MtiShape,
            None,
            format!("MTI {mti:?} is not four decimal digits"),
        ));
        return;
    }
    let digits: Vec<u32> = mti.chars().map(|c| c.to_digit(10).expect("checked all-decimal above")).collect();
    if !matches!(digits[0], 0 | 1 | 2) {
        out.push(ValidationDiagnostic::new(
            ValidationRule::MtiShape,
            None,
            format!("MTI {mti:?}: version digit {} is not one of 0, 1, 2", digits[0]),
        ));
    }
    if !matches!(digits[1], 1 | 2 | 3 | 4 | 5 | 6 | 8 | 9) {
        out.push(ValidationDiagnostic::new(
            ValidationRule::MtiShape,
            None,
            format!("MTI {mti:?}: message class digit {} is not one of 1-6, 8, 9", digits[1]),
        ));
    }
}

/// Fields 1 and 65 are bitmap-continuation markers (invariant 5); a
/// caller setting them directly as data fields would be silently
/// overwritten by the derived bitmap on build, which is itself a bug.
fn check_bitmap_consistency(message: &Message, out: &mut Vec<ValidationDiagnostic>) {
    for marker in [1u8, 65u8] {
        if message.field(marker).is_some() {
            out.push(ValidationDiagnostic::new(
                ValidationRule::BitmapConsistency,
                Some(marker),
                "field is a bitmap-continuation marker and must not be set directly".to_string(),
            ));
        }
    }
}

fn check_fields(message: &Message, out: &mut Vec<ValidationDiagnostic>) {
    let mut numbers: Vec<u8> = message.fields.keys().copied().collect();
    numbers.sort_unstable();
    for field_num in numbers {
        if field_num == 1 || field_num == 65 {
            continue;
        }
        let Some(def) = schema::definition_of(field_num, message.version, message.network) else {
            out.push(ValidationDiagnostic::unknown_field(field_num));
            continue;
        };
        let value = message.field(field_num).expect("field number came from the same map");

        match value {
            FieldValue::Text(s) => {
                if let Err(reason) = field::check_char_class(def.data_type, s) {
                    out.push(ValidationDiagnostic::new(ValidationRule::CharacterClass, Some(field_num), reason));
                }
                let len = s.chars().count();
                check_length(field_num, &def, len, out);
            }
            FieldValue::Binary(bytes) => {
                check_length(field_num, &def, bytes.len(), out);
            }
        }
    }
}

fn check_length(field_num: u8, def: &schema::FieldDefinition, len: usize, out: &mut Vec<ValidationDiagnostic>) {
    use crate::schema::{LengthType, PaddingDirection};
    match def.length_type {
        LengthType::Fixed => {
            // Unpadded (binary) fixed fields need an exact match; text
            // fields shorter than max are filled in on encode, so only
            // overlong values are an error here.
            if def.padding_direction == PaddingDirection::None {
                if len != def.max_length as usize {
                    out.push(ValidationDiagnostic::new(
                        ValidationRule::Length,
                        Some(field_num),
                        format!("expected exactly {} units, got {len}", def.max_length),
                    ));
                }
            } else if len > def.max_length as usize {
                out.push(ValidationDiagnostic::new(
                    ValidationRule::Length,
                    Some(field_num),
                    format!("length {len} exceeds fixed width {}", def.max_length),
                ));
            }
        }
        LengthType::Llvar | LengthType::Lllvar => {
            if len > def.max_length as usize {
                out.push(ValidationDiagnostic::new(
                    ValidationRule::Length,
                    Some(field_num),
                    format!("length {len} exceeds max {}", def.max_length),
                ));
            }
            if len < def.min_length as usize {
                out.push(ValidationDiagnostic::new(
                    ValidationRule::Length,
                    Some(field_num),
                    format!("length {len} below min {}", def.min_length),
                ));
            }
        }
    }
}

/// Luhn mod-10 check digit over field 2 (PAN), per spec.md §4.7 rule 5.
fn check_pan_luhn(message: &Message, out: &mut Vec<ValidationDiagnostic>) {
    let Some(FieldValue::Text(pan)) = message.field(2) else {
        return;
    };
    if !pan.bytes().all(|b| b.is_ascii_digit()) || pan.is_empty() {
        return; // character-class check already reports this
    }
    if !luhn_valid(pan) {
        out.push(ValidationDiagnostic::new(
            ValidationRule::PanLuhn,
            Some(2),
            format!("PAN {pan:?} fails the Luhn checksum"),
        ));
    }
}

fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().rev().enumerate() {
        let mut d = c.to_digit(10).expect("caller verified all-decimal");
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

/// Only a caller-*supplied* network triggers this rule (`Message::network_supplied`):
/// auto-detection from field 2 identifies a likely scheme but does not assert the
/// message actually satisfies that scheme's required-field contract (see `DESIGN.md`).
fn check_required_fields(message: &Message, out: &mut Vec<ValidationDiagnostic>) {
    if !message.network_supplied {
        return;
    }
    let Some(network) = message.network else {
        return;
    };
    for field_num in schema::required_fields(network) {
        if message.field(field_num).is_none() {
            out.push(ValidationDiagnostic::new(
                ValidationRule::RequiredField,
                Some(field_num),
                format!("required by {network} but not present"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBuilder;
    use crate::schema::{Network, Version};

    #[test]
    fn valid_message_has_no_diagnostics() {
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
            .build();
        assert!(message.is_ok());
    }

    #[test]
    fn bad_mti_shape_reported() {
        let mut message = crate::message::Message::new("2", Version::V1987);
        message.set_field(2, FieldValue::Text("4111111111111111".to_string()));
        let diags = validate(&message);
        assert!(diags.iter().any(|d| d.rule == ValidationRule::MtiShape));
    }

    #[test]
    fn invalid_luhn_reported() {
        let mut message = crate::message::Message::new("0200", Version::V1987);
        message.set_field(2, FieldValue::Text("4111111111111112".to_string()));
        let diags = validate(&message);
        assert!(diags.iter().any(|d| d.rule == ValidationRule::PanLuhn));
    }

    #[test]
    fn missing_required_field_reported() {
        let mut message = crate::message::Message::new("0200", Version::V1987);
        message.network = Some(Network::Visa);
        message.network_supplied = true;
        message.set_field(2, FieldValue::Text("4111111111111111".to_string()));
        let diags = validate(&message);
        assert!(diags.iter().any(|d| d.rule == ValidationRule::RequiredField));
    }

    #[test]
    fn setting_marker_field_directly_reported() {
        let mut message = crate::message::Message::new("0200", Version::V1987);
        message.set_field(1, FieldValue::Binary(vec![0; 8]));
        let diags = validate(&message);
        assert!(diags.iter().any(|d| d.rule == ValidationRule::BitmapConsistency));
    }

    #[test]
    fn bad_character_class_reported() {
        let mut message = crate::message::Message::new("0200", Version::V1987);
        message.set_field(3, FieldValue::Text("ABCDEF".to_string()));
        let diags = validate(&message);
        assert!(diags.iter().any(|d| d.rule == ValidationRule::CharacterClass));
    }

    #[test]
    fn length_over_max_reported() {
        let mut message = crate::message::Message::new("0200", Version::V1987);
        message.set_field(11, FieldValue::Text("1234567".to_string()));
        let diags = validate(&message);
        assert!(diags.iter().any(|d| d.rule == ValidationRule::Length));
    }

    #[test]
    fn luhn_valid_known_test_numbers() {
        assert!(luhn_valid("4111111111111111"));
        assert!(luhn_valid("5500000000000004"));
        assert!(!luhn_valid("4111111111111112"));
    }
}
