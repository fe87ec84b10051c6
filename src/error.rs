//! Error types for the codec. Parse and build fail fast with a single
//! error; validation instead collects a list of diagnostics (see
//! `crate::validate`).

use thiserror::Error;

/// Errors raised while parsing a wire message into a [`crate::message::Message`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("truncated MTI: expected 4 bytes, got {0}")]
    TruncatedMti(usize),

    #[error("invalid MTI {0:?}: not four decimal digits")]
    InvalidMti(String),

    #[error("invalid bitmap: {0}")]
    InvalidBitmap(String),

    #[error("invalid length prefix for field {field}: {reason}")]
    InvalidLength { field: u16, reason: String },

    #[error("bit set for field {0} outside the effective schema")]
    UnknownField(u16),

    #[error("invalid character class for field {field}: {reason}")]
    InvalidCharClass { field: u16, reason: String },

    #[error("{0} trailing byte(s) after the last present field")]
    TrailingGarbage(usize),
}

/// Errors raised while encoding a field's value (used by both the
/// builder and, via [`BuildError`], the public `build` operation).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("value for field {field} is too long: {len} > max {max}")]
    ValueTooLong { field: u16, len: usize, max: usize },

    #[error("value for field {field} is too short: {len} < min {min}")]
    ValueTooShort { field: u16, len: usize, min: usize },

    #[error("field {0} not present in the effective schema")]
    UnknownField(u16),
}

/// Returned by the public `build` operation: a message that fails
/// validation is never emitted. Carries the full diagnostic list so
/// the caller can see every problem at once.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("build refused: {} diagnostic(s)", diagnostics.len())]
pub struct BuildError {
    pub diagnostics: Vec<crate::validate::ValidationDiagnostic>,
}

/// EMV (field 55) TLV parse failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TlvError {
    #[error("truncated tag at offset {0}")]
    TruncatedTag(usize),

    #[error("malformed tag continuation at offset {0}")]
    MalformedTagContinuation(usize),

    #[error("truncated length at offset {0}")]
    TruncatedLength(usize),

    #[error("length overflow at offset {0}")]
    LengthOverflow(usize),

    #[error("truncated value at offset {0}: need {needed}, have {available}")]
    TruncatedValue {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("invalid hex input: {0}")]
    InvalidHex(String),
}
