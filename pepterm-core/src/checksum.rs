//! LRC checksum for the PeP framing layer
//!
//! The LRC is the XOR of every byte that follows the start marker, up to and
//! including the end marker. The start marker and the LRC byte itself are
//! excluded.

use tracing::trace;

/// Calculate the LRC over a frame body
///
/// `body` must span from the first byte after the start marker through the
/// end marker inclusive.
///
/// # Examples
///
/// ```
/// use pepterm_core::checksum;
///
/// let lrc = checksum::calculate(b"UP00101\x1C\x1C\x03");
/// assert_eq!(lrc, 0x36);
/// ```
pub fn calculate(body: &[u8]) -> u8 {
    let mut lrc = 0u8;
    for &byte in body {
        lrc ^= byte;
    }

    trace!(
        body_len = body.len(),
        lrc = format!("0x{:02X}", lrc),
        "Calculated LRC"
    );

    lrc
}

/// Verify a received LRC against a frame body
pub fn verify(body: &[u8], expected: u8) -> bool {
    calculate(body) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lrc_empty_body() {
        assert_eq!(calculate(&[]), 0);
    }

    #[test]
    fn test_lrc_single_byte() {
        assert_eq!(calculate(&[0xA5]), 0xA5);
    }

    #[test]
    fn test_lrc_self_cancels() {
        // XOR of a byte with itself is zero
        assert_eq!(calculate(&[0x42, 0x42]), 0);
        assert_eq!(calculate(&[0x42, 0x42, 0x17]), 0x17);
    }

    #[test]
    fn test_lrc_known_vector() {
        // Body of an empty payment-request frame: header, two separators, end marker
        let body = b"UP00101\x1C\x1C\x03";
        assert_eq!(calculate(body), 0x36);
    }

    #[test]
    fn test_lrc_verify() {
        let body = b"UP10151\x1C\x30\x30\x03";
        let lrc = calculate(body);

        assert!(verify(body, lrc));
        assert!(!verify(body, lrc.wrapping_add(1)));
    }

    #[test]
    fn test_lrc_order_independent() {
        // XOR commutes; the checksum cannot detect byte reordering
        assert_eq!(calculate(&[1, 2, 3]), calculate(&[3, 2, 1]));
    }
}
