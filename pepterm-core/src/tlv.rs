//! TLV field and amount codecs
//!
//! Every field is `tag (4 chars) + length (2 uppercase hex chars) + value`.
//! Numeric fields carry their decimal digits straight through as text,
//! padded to a whole number of two-digit bytes; the length byte counts those
//! bytes. This is not packed BCD, and the parser consumes `length * 2`
//! characters per field while text fields are built with a character-count
//! length. Both quirks are load-bearing for wire compatibility and must not
//! be normalized.

use std::collections::BTreeMap;

use crate::constants::tags;
use crate::error::{Error, Result};

/// Wire form of the `!` marker that locks the amount against on-terminal
/// editing
pub const AMOUNT_MARKER: &str = "21";

/// Value encoding for a TLV field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// Fixed-width numeric (`n<d>`): zero-padded to `d` digits
    Numeric(u8),
    /// Variable-width numeric (`..n<d>`): width follows the actual digit
    /// count, capped at `d`
    VarNumeric(u8),
    /// Plain text: value verbatim, length counts characters
    Text,
    /// Raw binary (`b<n>`): value is the hex image of the bytes, length
    /// counts bytes
    Binary,
}

/// Number of bytes a BCD value of `digits` digits occupies
pub fn bcd_byte_len(digits: u8) -> usize {
    (digits as usize).div_ceil(2)
}

/// Zero-pad a digit string to a whole number of BCD bytes
///
/// A value already longer than the target width passes through unchanged;
/// callers enforce width limits before encoding.
pub fn encode_bcd(value: &str, digits: u8) -> String {
    let width = bcd_byte_len(digits) * 2;
    let pad = width.saturating_sub(value.len());

    let mut out = String::with_capacity(width.max(value.len()));
    for _ in 0..pad {
        out.push('0');
    }
    out.push_str(value);
    out
}

/// Build one TLV field
///
/// # Errors
///
/// - `InvalidDigits` if a numeric format receives non-digit characters
/// - `InvalidHex` if a binary format receives anything but whole hex bytes
/// - `FieldTooLong` if the value exceeds the format width, or a text value
///   does not fit the one-byte length
///
/// # Examples
///
/// ```
/// use pepterm_core::tlv::{FieldFormat, build_field};
///
/// let field = build_field("DF01", "1", FieldFormat::Numeric(4)).unwrap();
/// assert_eq!(field, "DF01020001");
/// ```
pub fn build_field(tag: &str, value: &str, format: FieldFormat) -> Result<String> {
    let (encoded, length) = match format {
        FieldFormat::Numeric(digits) => {
            ensure_digits(tag, value)?;
            if value.len() > digits as usize {
                return Err(Error::FieldTooLong {
                    tag: tag.to_string(),
                    len: value.len(),
                });
            }
            (encode_bcd(value, digits), bcd_byte_len(digits))
        }
        FieldFormat::VarNumeric(max_digits) => {
            ensure_digits(tag, value)?;
            if value.len() > max_digits as usize {
                return Err(Error::FieldTooLong {
                    tag: tag.to_string(),
                    len: value.len(),
                });
            }
            let digits = value.len() as u8;
            (encode_bcd(value, digits), bcd_byte_len(digits))
        }
        FieldFormat::Text => (value.to_string(), value.chars().count()),
        FieldFormat::Binary => {
            if value.len() % 2 != 0 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::InvalidHex {
                    tag: tag.to_string(),
                });
            }
            (value.to_string(), value.len() / 2)
        }
    };

    if length > 0xFF {
        return Err(Error::FieldTooLong {
            tag: tag.to_string(),
            len: length,
        });
    }

    Ok(format!("{}{:02X}{}", tag, length, encoded))
}

/// Build one TLV field, picking the format from the known-tag table
///
/// Transaction type, sequence number and operator code are fixed-width
/// numeric; every other tag encodes as text.
pub fn build_field_auto(tag: &str, value: &str) -> Result<String> {
    let format = match tag {
        tags::TRANSACTION_TYPE => FieldFormat::Numeric(4),
        tags::SEQUENCE_NUMBER => FieldFormat::Numeric(6),
        tags::OPERATOR_CODE => FieldFormat::Numeric(4),
        _ => FieldFormat::Text,
    };

    build_field(tag, value, format)
}

/// Parse a TLV run into a tag-to-value mapping
///
/// Consumes `tag(4) + length(2 hex) + length*2` characters per field and
/// stops quietly at the first field the remaining data cannot satisfy;
/// whatever parsed up to that point is returned. A repeated tag keeps its
/// last value.
///
/// # Examples
///
/// ```
/// use pepterm_core::tlv::parse_fields;
///
/// let fields = parse_fields("DF0403TESTOK");
/// assert_eq!(fields["DF04"], "TESTOK");
/// ```
pub fn parse_fields(data: &str) -> BTreeMap<String, String> {
    let chars: Vec<char> = data.chars().collect();
    let mut fields = BTreeMap::new();
    let mut pos = 0;

    loop {
        if pos + 4 > chars.len() {
            break;
        }
        let tag: String = chars[pos..pos + 4].iter().collect();
        pos += 4;

        if pos + 2 > chars.len() {
            break;
        }
        let length_hex: String = chars[pos..pos + 2].iter().collect();
        let Ok(length) = usize::from_str_radix(&length_hex, 16) else {
            break;
        };
        pos += 2;

        // The length byte counts bytes; values travel as two chars per byte
        let value_chars = length * 2;
        if pos + value_chars > chars.len() {
            break;
        }
        let value: String = chars[pos..pos + value_chars].iter().collect();
        pos += value_chars;

        fields.insert(tag, value);
    }

    fields
}

/// Encode a currency amount as marker-prefixed minor units
///
/// Rounds `amount * 100` to an integer and left-pads it to twelve digits.
///
/// # Errors
///
/// `AmountOutOfRange` for negative or non-finite amounts and for amounts
/// whose minor units need more than twelve digits.
///
/// # Examples
///
/// ```
/// use pepterm_core::tlv::encode_amount;
///
/// assert_eq!(encode_amount(10.50).unwrap(), "21000000001050");
/// ```
pub fn encode_amount(amount: f64) -> Result<String> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::AmountOutOfRange { amount });
    }

    let minor = (amount * 100.0).round();
    if minor >= 1e12 {
        return Err(Error::AmountOutOfRange { amount });
    }

    Ok(format!("{}{:012}", AMOUNT_MARKER, minor as u64))
}

/// Decode a marker-prefixed amount back to major units
///
/// Strips the edit-lock marker when present, then leading zeros; an
/// all-zero value decodes to `0`.
///
/// # Errors
///
/// `InvalidAmountField` if the remaining characters are not decimal digits.
pub fn decode_amount(encoded: &str) -> Result<f64> {
    let clean = encoded.strip_prefix(AMOUNT_MARKER).unwrap_or(encoded);
    let clean = clean.trim_start_matches('0');
    if clean.is_empty() {
        return Ok(0.0);
    }

    let minor: u64 = clean.parse().map_err(|_| Error::InvalidAmountField {
        value: encoded.to_string(),
    })?;

    Ok(minor as f64 / 100.0)
}

fn ensure_digits(tag: &str, value: &str) -> Result<()> {
    if value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::InvalidDigits {
            tag: tag.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_fixed_numeric_pads() {
        assert_eq!(
            build_field("DF01", "1", FieldFormat::Numeric(4)).unwrap(),
            "DF01020001"
        );
        assert_eq!(
            build_field("DF01", "0001", FieldFormat::Numeric(4)).unwrap(),
            "DF01020001"
        );
    }

    #[test]
    fn test_build_fixed_numeric_odd_digits() {
        // n6 occupies three bytes, six digit characters
        assert_eq!(
            build_field("DF03", "42", FieldFormat::Numeric(6)).unwrap(),
            "DF0303000042"
        );
    }

    #[test]
    fn test_build_var_numeric_follows_value_width() {
        assert_eq!(
            build_field("DF03", "123", FieldFormat::VarNumeric(6)).unwrap(),
            "DF03020123"
        );
        assert_eq!(
            build_field("DF03", "12", FieldFormat::VarNumeric(6)).unwrap(),
            "DF030112"
        );
    }

    #[test]
    fn test_build_var_numeric_empty_value() {
        assert_eq!(
            build_field("DF03", "", FieldFormat::VarNumeric(6)).unwrap(),
            "DF0300"
        );
    }

    #[test]
    fn test_build_text() {
        assert_eq!(
            build_field("DF04", "TESTOK", FieldFormat::Text).unwrap(),
            "DF0406TESTOK"
        );
    }

    #[test]
    fn test_build_text_length_in_uppercase_hex() {
        let value = "GastroKiosk;BakerySystem;1.";
        assert_eq!(value.len(), 27);
        assert_eq!(
            build_field("DF11", value, FieldFormat::Text).unwrap(),
            format!("DF111B{}", value)
        );
    }

    #[test]
    fn test_build_binary() {
        assert_eq!(
            build_field("DF0B", "0002", FieldFormat::Binary).unwrap(),
            "DF0B020002"
        );
    }

    #[test]
    fn test_build_rejects_malformed_binary() {
        let result = build_field("DF0B", "002", FieldFormat::Binary);
        assert!(matches!(result, Err(Error::InvalidHex { .. })));

        let result = build_field("DF0B", "00ZZ", FieldFormat::Binary);
        assert!(matches!(result, Err(Error::InvalidHex { .. })));
    }

    #[test]
    fn test_build_rejects_non_digits() {
        let result = build_field("DF01", "12A4", FieldFormat::Numeric(4));
        assert!(matches!(result, Err(Error::InvalidDigits { .. })));
    }

    #[test]
    fn test_build_rejects_overlong_numeric() {
        let result = build_field("DF05", "12345", FieldFormat::Numeric(4));
        assert!(matches!(result, Err(Error::FieldTooLong { .. })));

        let result = build_field("DF03", "1234567", FieldFormat::VarNumeric(6));
        assert!(matches!(result, Err(Error::FieldTooLong { .. })));
    }

    #[test]
    fn test_build_rejects_overlong_text() {
        let value = "x".repeat(256);
        let result = build_field("DF0A", &value, FieldFormat::Text);
        assert!(matches!(result, Err(Error::FieldTooLong { .. })));
    }

    #[test]
    fn test_build_field_auto_table() {
        assert_eq!(build_field_auto("DF01", "0001").unwrap(), "DF01020001");
        assert_eq!(build_field_auto("DF05", "1").unwrap(), "DF05020001");
        assert_eq!(build_field_auto("DF03", "7").unwrap(), "DF0303000007");
        // Unknown tags fall back to text
        assert_eq!(build_field_auto("DF99", "AB").unwrap(), "DF9902AB");
    }

    #[test]
    fn test_parse_fields_basic() {
        let fields = parse_fields("DF56021234DF0403TESTOK");

        assert_eq!(fields.len(), 2);
        assert_eq!(fields["DF56"], "1234");
        assert_eq!(fields["DF04"], "TESTOK");
    }

    #[test]
    fn test_parse_fields_length_counts_bytes() {
        // Length 02 means two bytes, four value characters
        let fields = parse_fields("DF0102ABCD");
        assert_eq!(fields["DF01"], "ABCD");
    }

    #[test]
    fn test_parse_fields_last_tag_wins() {
        let fields = parse_fields("DF0401AADF0401BB");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["DF04"], "BB");
    }

    #[test]
    fn test_parse_fields_partial_tolerance() {
        // Second field claims more value chars than remain; parsing stops
        // with the first field intact
        let fields = parse_fields("DF56021234DF04FFAB");

        assert_eq!(fields.len(), 1);
        assert_eq!(fields["DF56"], "1234");
    }

    #[test]
    fn test_parse_fields_garbage_length() {
        let fields = parse_fields("DF56021234DF04GGAB");

        assert_eq!(fields.len(), 1);
        assert_eq!(fields["DF56"], "1234");
    }

    #[test]
    fn test_parse_fields_empty() {
        assert!(parse_fields("").is_empty());
        assert!(parse_fields("DF5").is_empty());
    }

    #[test]
    fn test_amount_golden() {
        assert_eq!(encode_amount(10.50).unwrap(), "21000000001050");
        assert_eq!(encode_amount(0.0).unwrap(), "21000000000000");
        assert_eq!(encode_amount(25.00).unwrap(), "21000000002500");
    }

    #[test]
    fn test_amount_roundtrip() {
        for amount in [0.0, 0.01, 10.50, 25.00, 9_999_999_999.99] {
            let encoded = encode_amount(amount).unwrap();
            let decoded = decode_amount(&encoded).unwrap();
            assert_eq!(decoded, (amount * 100.0).round() / 100.0);
        }
    }

    #[test]
    fn test_amount_rounds_to_minor_units() {
        assert_eq!(encode_amount(10.505).unwrap(), "21000000001051");
        assert_eq!(encode_amount(10.504).unwrap(), "21000000001050");
    }

    #[test]
    fn test_decode_amount_without_marker() {
        assert_eq!(decode_amount("000000001050").unwrap(), 10.50);
    }

    #[test]
    fn test_decode_amount_all_zeros() {
        assert_eq!(decode_amount("21000000000000").unwrap(), 0.0);
        assert_eq!(decode_amount("21").unwrap(), 0.0);
    }

    #[test]
    fn test_decode_amount_marker_strip_quirk() {
        // A markerless value that happens to start with the marker digits
        // loses them; the encoder always emits the marker so round-trips
        // stay exact
        assert_eq!(decode_amount("210000").unwrap(), 0.0);
    }

    #[test]
    fn test_amount_out_of_range() {
        assert!(matches!(
            encode_amount(-1.0),
            Err(Error::AmountOutOfRange { .. })
        ));
        assert!(matches!(
            encode_amount(10_000_000_000.00),
            Err(Error::AmountOutOfRange { .. })
        ));
        assert!(matches!(
            encode_amount(f64::NAN),
            Err(Error::AmountOutOfRange { .. })
        ));
    }

    #[test]
    fn test_decode_amount_rejects_non_digits() {
        assert!(matches!(
            decode_amount("21ABC"),
            Err(Error::InvalidAmountField { .. })
        ));
    }

    // Property-based tests
    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: fixed-width numeric fields recover the original
            /// digits after zero-padding normalization
            #[test]
            fn prop_fixed_numeric_roundtrip(value in "[0-9]{1,4}") {
                let field = build_field("DF01", &value, FieldFormat::Numeric(4)).unwrap();
                let fields = parse_fields(&field);

                let parsed = fields["DF01"].trim_start_matches('0');
                let original = value.trim_start_matches('0');
                prop_assert_eq!(parsed, original);
            }

            /// Property: amounts representable in twelve digits of minor
            /// units round-trip exactly
            #[test]
            fn prop_amount_roundtrip(minor in 0u64..1_000_000_000_000) {
                let amount = minor as f64 / 100.0;
                let encoded = encode_amount(amount).unwrap();
                let decoded = decode_amount(&encoded).unwrap();

                prop_assert_eq!(decoded, amount);
            }

            /// Property: parsing never panics on arbitrary printable input
            #[test]
            fn prop_parse_fields_total(data in "[ -~]{0,64}") {
                let _ = parse_fields(&data);
            }
        }
    }
}
