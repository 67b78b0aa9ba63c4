//! PeP protocol constants

use bitflags::bitflags;

/// Frame start marker
pub const STX: u8 = 0x02;

/// Frame end marker
pub const ETX: u8 = 0x03;

/// Field separator
pub const FS: u8 = 0x1C;

/// Positive single-byte frame acknowledgment
pub const ACK: u8 = 0x06;

/// Negative single-byte frame acknowledgment
pub const NAK: u8 = 0x15;

/// Lead byte of the binding-discovery datagram (`?`)
pub const DISCOVERY_MARKER: u8 = 0x3F;

/// Legacy single-byte binding acknowledgment (`:`)
pub const BIND_ACK_LEGACY: u8 = 0x3A;

/// Field separator as a character, for splitting decoded payload text
pub const FS_CHAR: char = FS as char;

/// Field separator as a string slice, for joining payload segments
pub const FS_STR: &str = "\u{1C}";

/// Frame headers (7 ASCII chars: `UP` + direction + module + command)
pub mod headers {
    /// Payment request, register to terminal
    pub const PAYMENT_REQUEST: &str = "UP00101";

    /// Binding acknowledgment, terminal to register
    pub const BIND_ACK: &str = "UP10052";

    /// Transaction result, terminal to register
    pub const RESULT: &str = "UP10151";

    /// Transaction progress, terminal to register
    pub const PROGRESS: &str = "UP10152";

    /// Header prefix of every terminal-originated frame
    pub const TERMINAL_PREFIX: &str = "UP1";
}

/// TLV tags
pub mod tags {
    /// Transaction type (n4)
    pub const TRANSACTION_TYPE: &str = "DF01";

    /// Transaction amount, marker-prefixed minor units
    pub const AMOUNT: &str = "DF02";

    /// Transaction sequence number (n6)
    pub const SEQUENCE_NUMBER: &str = "DF03";

    /// Authorization code
    pub const AUTH_CODE: &str = "DF04";

    /// Operator code (n4)
    pub const OPERATOR_CODE: &str = "DF05";

    /// Masked card number
    pub const MASKED_PAN: &str = "DF09";

    /// Free-text description, at most 42 characters (..an42)
    pub const DESCRIPTION: &str = "DF0A";

    /// Request option flags (b2)
    pub const REQUEST_FLAGS: &str = "DF0B";

    /// Cash register system identification
    pub const SYSTEM_INFO: &str = "DF11";

    /// Transaction tracking id
    pub const TRACKING_ID: &str = "DF12";

    /// Terminal-assigned transaction number (STAN)
    pub const TRANSACTION_NUMBER: &str = "DF56";
}

/// Transaction type codes carried in the transaction-type field
pub mod transaction_types {
    /// Card sale
    pub const SALE: &str = "0001";
}

bitflags! {
    /// Option flags carried in the request-flags field
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RequestFlags: u16 {
        /// Ask the terminal to return extended data with the result
        const EXTENDED_RESPONSE = 0x0002;
    }
}

impl RequestFlags {
    /// Wire form of the flags word: four uppercase hex characters
    pub fn encode(&self) -> String {
        format!("{:04X}", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_seven_chars() {
        assert_eq!(headers::PAYMENT_REQUEST.len(), 7);
        assert_eq!(headers::BIND_ACK.len(), 7);
        assert_eq!(headers::RESULT.len(), 7);
        assert_eq!(headers::PROGRESS.len(), 7);
    }

    #[test]
    fn test_request_flags_encode() {
        assert_eq!(RequestFlags::EXTENDED_RESPONSE.encode(), "0002");
        assert_eq!(RequestFlags::empty().encode(), "0000");
    }
}
