//! Error types for pepterm-core

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame structure is broken (short input, missing markers or separator)
    #[error("Malformed frame: {reason}")]
    Malformed {
        reason: &'static str,
    },

    /// Frame ends before the expected byte
    #[error("Truncated frame: {reason}")]
    Truncated {
        reason: &'static str,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:02X}, received 0x{received:02X}")]
    ChecksumMismatch {
        expected: u8,
        received: u8,
    },

    /// Field value does not fit the declared format width
    #[error("Field {tag} value too long: {len}")]
    FieldTooLong {
        tag: String,
        len: usize,
    },

    /// Numeric field holds characters other than decimal digits
    #[error("Field {tag} expects decimal digits only")]
    InvalidDigits {
        tag: String,
    },

    /// Binary field is not a whole number of hex byte pairs
    #[error("Field {tag} expects whole hex bytes")]
    InvalidHex {
        tag: String,
    },

    /// Amount cannot be represented as twelve digits of minor units
    #[error("Amount out of range: {amount}")]
    AmountOutOfRange {
        amount: f64,
    },

    /// Amount field did not decode as digits
    #[error("Invalid amount field: {value:?}")]
    InvalidAmountField {
        value: String,
    },
}
