//! # iso8583-codec
//!
//! An ISO 8583 financial-message codec: parse a wire byte stream into
//! a structured [`Message`], build a structured message back into
//! wire bytes, and validate a message's structure and content against
//! a schema that varies by protocol version and card network.
//!
//! ## Layout
//!
//! - [`schema`]: per-field metadata for the base, per-version, and
//!   per-network schemas, plus PAN-prefix network detection.
//! - [`bitmap`]: the 64/128-bit field-presence bitmap codec.
//! - [`tlv`]: BER-TLV codec for EMV chip-card data (field 55).
//! - [`field`]: per-field encode/decode (fixed, LLVAR, LLLVAR,
//!   character class, padding).
//! - [`message`]: the [`Message`] record and the `parse`/`build`
//!   operations that drive MTI, bitmap, and field codec.
//! - [`validate`]: MTI shape, character class, length, PAN Luhn, and
//!   network required-field checks, collected as a diagnostic list.
//! - [`pool`] (feature `pool`): an optional bounded stack of reusable
//!   `Message` buffers for allocation-sensitive callers.
//!
//! ## Example
//!
//! ```
//! use iso8583_codec::{Message, MessageBuilder, Network, FieldValue};
//!
//! let message = MessageBuilder::new("0100")
//!     .network(Network::Visa)
//!     .text_field(2, "4111111111111111")
//!     .text_field(3, "000000")
//!     .text_field(4, "000000001000")
//!     .text_field(11, "123456")
//!     .text_field(14, "2512")
//!     .text_field(22, "012")
//!     .text_field(24, "200")
//!     .text_field(25, "00")
//!     .build()
//!     .expect("valid message");
//!
//! let wire = iso8583_codec::build(&message).expect("build");
//! let parsed = iso8583_codec::parse(&wire, message.version, None).expect("parse");
//! assert_eq!(parsed.field(2), Some(&FieldValue::Text("4111111111111111".to_string())));
//! ```

pub mod bitmap;
pub mod error;
pub mod field;
pub mod message;
#[cfg(feature = "pool")]
pub mod pool;
pub mod schema;
pub mod tlv;
pub mod validate;

pub use error::{BuildError, EncodeError, ParseError, TlvError};
pub use field::FieldValue;
pub use message::{build, parse, Message, MessageBuilder};
#[cfg(feature = "pool")]
pub use pool::MessagePool;
pub use schema::{
    definition_of, detect_network, required_fields, DataType, FieldDefinition, LengthType,
    Network, PaddingDirection, Version,
};
pub use tlv::{build_emv, parse_emv, TlvEntry};
pub use validate::{validate, ValidationDiagnostic, ValidationRule};
