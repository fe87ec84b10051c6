//! Per-field metadata for the base, per-version, and per-network
//! schemas, plus network detection.
//!
//! Lookups are O(1): three static tables (base, version overlay,
//! network overlay) are consulted in order and the composite
//! definition is cached the first time a given
//! `(field, version, network)` triple is requested, per the "Schema
//! overlays" design note — the key space is bounded
//! (`3 versions * 7 network-slots * 129 fields`), so a `HashMap`
//! behind a `OnceLock` is simpler than an LRU and still O(1) amortized.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Character-class / content type of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Decimal digits only.
    Numeric,
    /// Alphabetic characters only.
    Alpha,
    /// Alphabetic and numeric characters.
    Alphanumeric,
    /// Alphanumeric plus special characters (ans).
    AlphanumericSpecial,
    /// Hex-encoded byte sequence.
    Binary,
    /// Track 2 magnetic-stripe format (digits, `=`, `D`).
    Track2,
}

/// How a field's length is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthType {
    /// No length prefix; value is padded/truncated to `max_length`.
    Fixed,
    /// Two decimal-digit length prefix (0-99).
    Llvar,
    /// Three decimal-digit length prefix (0-999).
    Lllvar,
}

/// Padding side applied on encode to reach a fixed field's width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaddingDirection {
    Left,
    Right,
    None,
}

/// The schema entry for one field number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDefinition {
    pub data_type: DataType,
    pub length_type: LengthType,
    pub max_length: u16,
    pub min_length: u16,
    pub padding_char: u8,
    pub padding_direction: PaddingDirection,
    pub description: &'static str,
}

impl FieldDefinition {
    const fn default_padding(data_type: DataType) -> (u8, PaddingDirection) {
        match data_type {
            DataType::Numeric => (b'0', PaddingDirection::Left),
            DataType::Binary => (0, PaddingDirection::None),
            _ => (b' ', PaddingDirection::Right),
        }
    }

    const fn fixed(data_type: DataType, len: u16, description: &'static str) -> Self {
        let (padding_char, padding_direction) = Self::default_padding(data_type);
        Self {
            data_type,
            length_type: LengthType::Fixed,
            max_length: len,
            min_length: len,
            padding_char,
            padding_direction,
            description,
        }
    }

    const fn llvar(data_type: DataType, max_len: u16, description: &'static str) -> Self {
        let (padding_char, padding_direction) = Self::default_padding(data_type);
        Self {
            data_type,
            length_type: LengthType::Llvar,
            max_length: max_len,
            min_length: 0,
            padding_char,
            padding_direction,
            description,
        }
    }

    const fn lllvar(data_type: DataType, max_len: u16, description: &'static str) -> Self {
        let (padding_char, padding_direction) = Self::default_padding(data_type);
        Self {
            data_type,
            length_type: LengthType::Lllvar,
            max_length: max_len,
            min_length: 0,
            padding_char,
            padding_direction,
            description,
        }
    }

    const fn with_max(mut self, max_length: u16) -> Self {
        self.max_length = max_length;
        if matches!(self.length_type, LengthType::Fixed) {
            self.min_length = max_length;
        }
        self
    }

    const fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        let (padding_char, padding_direction) = Self::default_padding(data_type);
        self.padding_char = padding_char;
        self.padding_direction = padding_direction;
        self
    }
}

macro_rules! iso_table {
    ($($field:expr => $def:expr),* $(,)?) => {{
        let mut table: [Option<FieldDefinition>; 129] = [None; 129];
        $(
            table[$field] = Some($def);
        )*
        table
    }};
}

/// Base schema: ISO 8583:1987, fields 1-128.
///
/// Field 1 and field 65 are present only as bitmap-continuation
/// markers (invariant 5 in `spec.md` §3); they are never looked up by
/// the field codec during normal field emission/consumption, but a
/// definition is kept here so `definition_of` returns something
/// sensible if a caller probes them directly.
pub static BASE_TABLE: [Option<FieldDefinition>; 129] = iso_table! {
    1 => FieldDefinition::fixed(DataType::Binary, 8, "Secondary bitmap indicator"),
    2 => FieldDefinition::llvar(DataType::Numeric, 19, "Primary account number"),
    3 => FieldDefinition::fixed(DataType::Numeric, 6, "Processing code"),
    4 => FieldDefinition::fixed(DataType::Numeric, 12, "Transaction amount"),
    5 => FieldDefinition::fixed(DataType::Numeric, 12, "Settlement amount"),
    6 => FieldDefinition::fixed(DataType::Numeric, 12, "Cardholder billing amount"),
    7 => FieldDefinition::fixed(DataType::Numeric, 10, "Transmission date and time"),
    8 => FieldDefinition::fixed(DataType::Numeric, 8, "Cardholder billing fee amount"),
    9 => FieldDefinition::fixed(DataType::Numeric, 8, "Settlement conversion rate"),
    10 => FieldDefinition::fixed(DataType::Numeric, 8, "Cardholder billing conversion rate"),
    11 => FieldDefinition::fixed(DataType::Numeric, 6, "System trace audit number"),
    12 => FieldDefinition::fixed(DataType::Numeric, 6, "Local transaction time"),
    13 => FieldDefinition::fixed(DataType::Numeric, 4, "Local transaction date"),
    14 => FieldDefinition::fixed(DataType::Numeric, 4, "Expiration date"),
    15 => FieldDefinition::fixed(DataType::Numeric, 4, "Settlement date"),
    16 => FieldDefinition::fixed(DataType::Numeric, 4, "Currency conversion date"),
    17 => FieldDefinition::fixed(DataType::Numeric, 4, "Capture date"),
    18 => FieldDefinition::fixed(DataType::Numeric, 4, "Merchant type"),
    19 => FieldDefinition::fixed(DataType::Numeric, 3, "Acquiring institution country code"),
    20 => FieldDefinition::fixed(DataType::Numeric, 3, "PAN extended country code"),
    21 => FieldDefinition::fixed(DataType::Numeric, 3, "Forwarding institution country code"),
    22 => FieldDefinition::fixed(DataType::Numeric, 3, "Point of service entry mode"),
    23 => FieldDefinition::fixed(DataType::Numeric, 3, "Card sequence number"),
    24 => FieldDefinition::fixed(DataType::Numeric, 3, "Function code"),
    25 => FieldDefinition::fixed(DataType::Numeric, 2, "Point of service condition code"),
    26 => FieldDefinition::fixed(DataType::Numeric, 2, "Point of service capture code"),
    27 => FieldDefinition::fixed(DataType::Numeric, 1, "Authorization identification response length"),
    28 => FieldDefinition::fixed(DataType::Numeric, 9, "Transaction fee amount"),
    29 => FieldDefinition::fixed(DataType::Numeric, 9, "Settlement fee amount"),
    30 => FieldDefinition::fixed(DataType::Numeric, 9, "Transaction processing fee amount"),
    31 => FieldDefinition::fixed(DataType::Numeric, 9, "Settlement processing fee amount"),
    32 => FieldDefinition::llvar(DataType::Numeric, 11, "Acquiring institution ID code"),
    33 => FieldDefinition::llvar(DataType::Numeric, 11, "Forwarding institution ID code"),
    34 => FieldDefinition::llvar(DataType::Alphanumeric, 28, "Extended PAN"),
    35 => FieldDefinition::llvar(DataType::Track2, 37, "Track 2 data"),
    36 => FieldDefinition::lllvar(DataType::Track2, 104, "Track 3 data"),
    37 => FieldDefinition::fixed(DataType::Alphanumeric, 12, "Retrieval reference number"),
    38 => FieldDefinition::fixed(DataType::Alphanumeric, 6, "Authorization identification response"),
    39 => FieldDefinition::fixed(DataType::Alphanumeric, 2, "Response code"),
    40 => FieldDefinition::fixed(DataType::Alphanumeric, 3, "Service restriction code"),
    41 => FieldDefinition::fixed(DataType::AlphanumericSpecial, 8, "Card acceptor terminal ID"),
    42 => FieldDefinition::fixed(DataType::AlphanumericSpecial, 15, "Card acceptor ID code"),
    43 => FieldDefinition::fixed(DataType::AlphanumericSpecial, 40, "Card acceptor name/location"),
    44 => FieldDefinition::llvar(DataType::AlphanumericSpecial, 25, "Additional response data"),
    45 => FieldDefinition::llvar(DataType::AlphanumericSpecial, 76, "Track 1 data"),
    46 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Additional data, ISO"),
    47 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Additional data, national"),
    48 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Additional data, private"),
    49 => FieldDefinition::fixed(DataType::Alphanumeric, 3, "Currency code, transaction"),
    50 => FieldDefinition::fixed(DataType::Alphanumeric, 3, "Currency code, settlement"),
    51 => FieldDefinition::fixed(DataType::Alphanumeric, 3, "Currency code, cardholder billing"),
    52 => FieldDefinition::fixed(DataType::Binary, 16, "PIN data"),
    53 => FieldDefinition::fixed(DataType::Numeric, 16, "Security related control information"),
    54 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 120, "Additional amounts"),
    55 => FieldDefinition::lllvar(DataType::Binary, 999, "ICC data (EMV)"),
    56 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    57 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    58 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    59 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    60 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (national)"),
    61 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (private)"),
    62 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (private)"),
    63 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (private)"),
    64 => FieldDefinition::fixed(DataType::Binary, 16, "Message authentication code"),
    65 => FieldDefinition::fixed(DataType::Binary, 16, "Tertiary bitmap indicator"),
    66 => FieldDefinition::fixed(DataType::Numeric, 1, "Settlement code"),
    67 => FieldDefinition::fixed(DataType::Numeric, 2, "Extended payment code"),
    68 => FieldDefinition::fixed(DataType::Numeric, 3, "Receiving institution country code"),
    69 => FieldDefinition::fixed(DataType::Numeric, 3, "Settlement institution country code"),
    70 => FieldDefinition::fixed(DataType::Numeric, 3, "Network management information code"),
    71 => FieldDefinition::fixed(DataType::Numeric, 4, "Message number"),
    72 => FieldDefinition::fixed(DataType::Numeric, 4, "Message number, last"),
    73 => FieldDefinition::fixed(DataType::Numeric, 6, "Action date"),
    74 => FieldDefinition::fixed(DataType::Numeric, 10, "Number of credits"),
    75 => FieldDefinition::fixed(DataType::Numeric, 10, "Number of credits, reversal"),
    76 => FieldDefinition::fixed(DataType::Numeric, 10, "Number of debits"),
    77 => FieldDefinition::fixed(DataType::Numeric, 10, "Number of debits, reversal"),
    78 => FieldDefinition::fixed(DataType::Numeric, 10, "Number of transfers"),
    79 => FieldDefinition::fixed(DataType::Numeric, 10, "Number of transfers, reversal"),
    80 => FieldDefinition::fixed(DataType::Numeric, 10, "Number of inquiries"),
    81 => FieldDefinition::fixed(DataType::Numeric, 10, "Number of authorizations"),
    82 => FieldDefinition::fixed(DataType::Numeric, 12, "Credits, processing fee amount"),
    83 => FieldDefinition::fixed(DataType::Numeric, 12, "Credits, transaction fee amount"),
    84 => FieldDefinition::fixed(DataType::Numeric, 12, "Debits, processing fee amount"),
    85 => FieldDefinition::fixed(DataType::Numeric, 12, "Debits, transaction fee amount"),
    86 => FieldDefinition::fixed(DataType::Numeric, 16, "Total amount of credits"),
    87 => FieldDefinition::fixed(DataType::Numeric, 16, "Credits, reversal amount"),
    88 => FieldDefinition::fixed(DataType::Numeric, 16, "Total amount of debits"),
    89 => FieldDefinition::fixed(DataType::Numeric, 16, "Debits, reversal amount"),
    90 => FieldDefinition::fixed(DataType::Numeric, 42, "Original data elements"),
    91 => FieldDefinition::fixed(DataType::Alpha, 1, "File update code"),
    92 => FieldDefinition::fixed(DataType::Numeric, 2, "File security code"),
    93 => FieldDefinition::fixed(DataType::Numeric, 5, "Response indicator"),
    94 => FieldDefinition::fixed(DataType::Alphanumeric, 7, "Service indicator"),
    95 => FieldDefinition::fixed(DataType::Alphanumeric, 42, "Replacement amounts"),
    96 => FieldDefinition::fixed(DataType::Binary, 16, "Message security code"),
    97 => FieldDefinition::fixed(DataType::Numeric, 17, "Net settlement amount"),
    98 => FieldDefinition::fixed(DataType::AlphanumericSpecial, 25, "Payee"),
    99 => FieldDefinition::llvar(DataType::Numeric, 11, "Settlement institution ID code"),
    100 => FieldDefinition::llvar(DataType::Numeric, 11, "Receiving institution ID code"),
    101 => FieldDefinition::llvar(DataType::AlphanumericSpecial, 17, "File name"),
    102 => FieldDefinition::llvar(DataType::AlphanumericSpecial, 28, "Account identification 1"),
    103 => FieldDefinition::llvar(DataType::AlphanumericSpecial, 28, "Account identification 2"),
    104 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 100, "Transaction description"),
    105 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    106 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    107 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    108 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    109 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    110 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    111 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (ISO)"),
    112 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (national)"),
    113 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (national)"),
    114 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (national)"),
    115 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (national)"),
    116 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (national)"),
    117 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (national)"),
    118 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (national)"),
    119 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (national)"),
    120 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (private)"),
    121 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (private)"),
    122 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (private)"),
    123 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (private)"),
    124 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 255, "Reserved (private)"),
    125 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 50, "Reserved (private)"),
    126 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 6, "Reserved (private)"),
    127 => FieldDefinition::lllvar(DataType::AlphanumericSpecial, 999, "Reserved (private)"),
    128 => FieldDefinition::fixed(DataType::Binary, 16, "Message authentication code"),
};

/// Version overlay for ISO 8583:1993 and :2003: field 22 (point of
/// service entry mode) widens from 3 numeric digits to 12
/// alphanumeric characters, the most common real-world delta between
/// the 1987 base and the later revisions (see `DESIGN.md`).
static VERSION_1993_OVERLAY: [Option<FieldDefinition>; 129] = iso_table! {
    22 => FieldDefinition::fixed(DataType::Numeric, 3, "Point of service entry mode")
        .with_max(12)
        .with_data_type(DataType::Alphanumeric),
};

/// No network changes field *format* in this implementation — only
/// the required-field set (`required_fields`) varies by network. The
/// overlay table exists to satisfy the three-table composition model
/// described in `spec.md`'s Design Notes, and is empty by design (see
/// `DESIGN.md`'s Open Question resolution).
static NETWORK_OVERLAY: [Option<FieldDefinition>; 129] = iso_table! {};

/// Card network that overlays additional field requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Jcb,
    Unionpay,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Network::Visa => "VISA",
            Network::Mastercard => "MASTERCARD",
            Network::Amex => "AMEX",
            Network::Discover => "DISCOVER",
            Network::Jcb => "JCB",
            Network::Unionpay => "UNIONPAY",
        };
        write!(f, "{s}")
    }
}

/// Protocol revision; selects the version overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    #[default]
    V1987,
    V1993,
    V2003,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Version::V1987 => "1987",
            Version::V1993 => "1993",
            Version::V2003 => "2003",
        };
        write!(f, "{s}")
    }
}

fn version_overlay(version: Version) -> &'static [Option<FieldDefinition>; 129] {
    match version {
        Version::V1987 => &BASE_TABLE,
        Version::V1993 | Version::V2003 => &VERSION_1993_OVERLAY,
    }
}

fn cache() -> &'static HashMap<(u8, Version, Option<Network>), Option<FieldDefinition>> {
    static CACHE: OnceLock<HashMap<(u8, Version, Option<Network>), Option<FieldDefinition>>> =
        OnceLock::new();
    CACHE.get_or_init(|| {
        let mut map = HashMap::new();
        let versions = [Version::V1987, Version::V1993, Version::V2003];
        let networks: [Option<Network>; 7] = [
            None,
            Some(Network::Visa),
            Some(Network::Mastercard),
            Some(Network::Amex),
            Some(Network::Discover),
            Some(Network::Jcb),
            Some(Network::Unionpay),
        ];
        for field in 0u16..129 {
            for &version in &versions {
                for &network in &networks {
                    let def = compose(field as u8, version, network);
                    map.insert((field as u8, version, network), def);
                }
            }
        }
        map
    })
}

fn compose(field: u8, version: Version, _network: Option<Network>) -> Option<FieldDefinition> {
    // "base ⊕ version-overlay ⊕ network-overlay (later overlays win per
    // field)": network overlay is consulted first, falling through to the
    // version overlay and finally the base table when it has nothing to
    // say for this field.
    let overlay = version_overlay(version);
    NETWORK_OVERLAY[field as usize]
        .or(overlay[field as usize])
        .or(BASE_TABLE[field as usize])
}

/// Effective field definition for `field` under `version`, optionally
/// narrowed by `network`. O(1) after first use (cached).
pub fn definition_of(field: u8, version: Version, network: Option<Network>) -> Option<FieldDefinition> {
    cache().get(&(field, version, network)).copied().flatten()
}

/// Required fields for a network's message set (`spec.md` §4.7 rule 6).
pub fn required_fields(network: Network) -> HashSet<u8> {
    match network {
        Network::Visa => [2, 3, 4, 11, 14, 22, 24, 25].into_iter().collect(),
        Network::Mastercard => [2, 3, 4, 11, 22, 24, 25].into_iter().collect(),
        Network::Amex => [2, 3, 4, 11, 22, 25].into_iter().collect(),
        Network::Discover => [2, 3, 4, 11, 22].into_iter().collect(),
        Network::Jcb => [2, 3, 4, 11, 22, 25].into_iter().collect(),
        Network::Unionpay => [2, 3, 4, 11, 22, 25, 49].into_iter().collect(),
    }
}

struct PrefixRule {
    network: Network,
    prefix_len: u8,
    low: u32,
    high: u32,
    lengths: &'static [usize],
}

/// Network detection table, ascending specificity (`spec.md` §4.1).
/// `prefix_len` digits of the PAN are compared against `[low, high]`;
/// ties are broken by the longest matching prefix.
static PREFIX_RULES: &[PrefixRule] = &[
    PrefixRule { network: Network::Visa, prefix_len: 1, low: 4, high: 4, lengths: &[13, 16, 19] },
    PrefixRule { network: Network::Mastercard, prefix_len: 2, low: 51, high: 55, lengths: &[16] },
    PrefixRule { network: Network::Mastercard, prefix_len: 4, low: 2221, high: 2720, lengths: &[16] },
    PrefixRule { network: Network::Amex, prefix_len: 2, low: 34, high: 34, lengths: &[15] },
    PrefixRule { network: Network::Amex, prefix_len: 2, low: 37, high: 37, lengths: &[15] },
    PrefixRule { network: Network::Discover, prefix_len: 4, low: 6011, high: 6011, lengths: &[16, 17, 18, 19] },
    PrefixRule { network: Network::Discover, prefix_len: 3, low: 644, high: 649, lengths: &[16, 17, 18, 19] },
    PrefixRule { network: Network::Discover, prefix_len: 2, low: 65, high: 65, lengths: &[16, 17, 18, 19] },
    PrefixRule { network: Network::Jcb, prefix_len: 4, low: 3528, high: 3589, lengths: &[16, 17, 18, 19] },
    PrefixRule { network: Network::Unionpay, prefix_len: 2, low: 62, high: 62, lengths: &[16, 17, 18, 19] },
];

/// Detect a card network from a PAN's digits. Returns `None` if the
/// PAN isn't all-decimal or matches no rule's prefix and length.
pub fn detect_network(pan: &str) -> Option<Network> {
    if pan.is_empty() || !pan.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut best: Option<(&PrefixRule, u8)> = None;
    for rule in PREFIX_RULES {
        let plen = rule.prefix_len as usize;
        if pan.len() < plen {
            continue;
        }
        let Ok(prefix_val) = pan[..plen].parse::<u32>() else {
            continue;
        };
        if prefix_val < rule.low || prefix_val > rule.high {
            continue;
        }
        if !rule.lengths.contains(&pan.len()) {
            continue;
        }
        match best {
            Some((_, best_len)) if best_len >= rule.prefix_len => {}
            _ => best = Some((rule, rule.prefix_len)),
        }
    }
    best.map(|(rule, _)| rule.network)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_field_lookup() {
        let def = definition_of(2, Version::V1987, None).unwrap();
        assert_eq!(def.data_type, DataType::Numeric);
        assert_eq!(def.length_type, LengthType::Llvar);
        assert_eq!(def.max_length, 19);
    }

    #[test]
    fn version_overlay_changes_field_22() {
        let base = definition_of(22, Version::V1987, None).unwrap();
        assert_eq!(base.max_length, 3);
        assert_eq!(base.data_type, DataType::Numeric);

        let overlay = definition_of(22, Version::V1993, None).unwrap();
        assert_eq!(overlay.max_length, 12);
        assert_eq!(overlay.data_type, DataType::Alphanumeric);
    }

    #[test]
    fn out_of_range_field_is_none() {
        assert!(definition_of(200 as u8, Version::V1987, None).is_none());
        assert!(definition_of(0, Version::V1987, None).is_none());
    }

    #[test]
    fn required_fields_mastercard() {
        let req = required_fields(Network::Mastercard);
        assert!(req.contains(&2));
        assert!(req.contains(&22));
        assert!(!req.contains(&14));
    }

    #[test]
    fn detect_network_visa() {
        assert_eq!(detect_network("4111111111111111"), Some(Network::Visa));
        assert_eq!(detect_network("4111111111111"), Some(Network::Visa));
    }

    #[test]
    fn detect_network_mastercard_ranges() {
        assert_eq!(detect_network("5412345678901234"), Some(Network::Mastercard));
        assert_eq!(detect_network("2221000000000000"), Some(Network::Mastercard));
        assert_eq!(detect_network("2720999999999999"), Some(Network::Mastercard));
    }

    #[test]
    fn detect_network_amex() {
        assert_eq!(detect_network("341111111111111"), Some(Network::Amex));
        assert_eq!(detect_network("371111111111111"), Some(Network::Amex));
    }

    #[test]
    fn detect_network_discover() {
        assert_eq!(detect_network("6011000000000000"), Some(Network::Discover));
        assert_eq!(detect_network("6445000000000000"), Some(Network::Discover));
        assert_eq!(detect_network("6511000000000000"), Some(Network::Discover));
    }

    #[test]
    fn detect_network_jcb() {
        assert_eq!(detect_network("3528000000000000"), Some(Network::Jcb));
        assert_eq!(detect_network("3589999999999999"), Some(Network::Jcb));
    }

    #[test]
    fn detect_network_unionpay() {
        assert_eq!(detect_network("6212345678901234"), Some(Network::Unionpay));
    }

    #[test]
    fn detect_network_none_for_unmatched() {
        assert_eq!(detect_network("9999999999999999"), None);
        assert_eq!(detect_network("not-a-pan"), None);
        assert_eq!(detect_network(""), None);
    }

    #[test]
    fn detect_network_wrong_length_fails() {
        // Visa prefix but an unsupported length.
        assert_eq!(detect_network("41111"), None);
    }
}
