//! Frame header classification
//!
//! A header is seven ASCII characters: `UP`, a direction digit, a two-digit
//! module and a two-digit command. Classification goes by prefix match so a
//! frame with a recognizable header and trailing junk still routes.

use std::fmt;

use crate::constants::headers;

/// Originator of a frame, taken from the header's direction digit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `0`: cash register to terminal
    Register,
    /// `1`: terminal to cash register
    Terminal,
}

impl Direction {
    /// Map a direction digit to its originator
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(Self::Register),
            b'1' => Some(Self::Terminal),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register => write!(f, "register"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// Frame classification by header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Payment request sent by the register
    PaymentRequest,
    /// Binding acknowledgment sent by the terminal
    BindAck,
    /// Transaction progress report sent by the terminal
    Progress,
    /// Transaction result sent by the terminal
    Result,
    /// Anything else; logged and dropped by the session
    Unknown,
}

impl FrameKind {
    /// Classify a header string
    ///
    /// # Examples
    ///
    /// ```
    /// use pepterm_core::FrameKind;
    ///
    /// assert_eq!(FrameKind::classify("UP10151"), FrameKind::Result);
    /// assert_eq!(FrameKind::classify("XX00000"), FrameKind::Unknown);
    /// ```
    pub fn classify(header: &str) -> Self {
        if header.starts_with(headers::BIND_ACK) {
            Self::BindAck
        } else if header.starts_with(headers::PROGRESS) {
            Self::Progress
        } else if header.starts_with(headers::RESULT) {
            Self::Result
        } else if header.starts_with(headers::PAYMENT_REQUEST) {
            Self::PaymentRequest
        } else {
            Self::Unknown
        }
    }

    /// Human-readable kind name
    pub fn name(&self) -> &'static str {
        match self {
            Self::PaymentRequest => "payment request",
            Self::BindAck => "binding acknowledgment",
            Self::Progress => "transaction progress",
            Self::Result => "transaction result",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_headers() {
        assert_eq!(FrameKind::classify("UP00101"), FrameKind::PaymentRequest);
        assert_eq!(FrameKind::classify("UP10052"), FrameKind::BindAck);
        assert_eq!(FrameKind::classify("UP10151"), FrameKind::Result);
        assert_eq!(FrameKind::classify("UP10152"), FrameKind::Progress);
    }

    #[test]
    fn test_classify_prefix_match() {
        // Trailing junk after a known header still classifies
        assert_eq!(FrameKind::classify("UP10152XY"), FrameKind::Progress);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(FrameKind::classify("UP10199"), FrameKind::Unknown);
        assert_eq!(FrameKind::classify(""), FrameKind::Unknown);
        assert_eq!(FrameKind::classify("UP1"), FrameKind::Unknown);
    }

    #[test]
    fn test_direction_from_byte() {
        assert_eq!(Direction::from_byte(b'0'), Some(Direction::Register));
        assert_eq!(Direction::from_byte(b'1'), Some(Direction::Terminal));
        assert_eq!(Direction::from_byte(b'2'), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FrameKind::Result.to_string(), "transaction result");
        assert_eq!(Direction::Terminal.to_string(), "terminal");
    }
}
