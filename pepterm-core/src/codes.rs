//! Progress and result code tables

use std::fmt;

/// Result code the terminal sends for an approved transaction
pub const SUCCESS_CODE: &str = "00";

/// Semantic progress states reported while a transaction runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    /// Payment application selection in progress
    SelectingApp,
    /// Terminal waits for a card
    WaitingForCard,
    /// Card data is being read
    ReadingCard,
    /// Authorization in progress
    Authorizing,
    /// Transaction accepted, result follows
    Accepted,
    /// Terminal prompts to insert or tap a card
    InsertOrTapCard,
    /// Code not in the table
    Unknown,
}

impl ProgressStatus {
    /// Map a two-character progress code to its semantic state
    pub fn from_code(code: &str) -> Self {
        match code {
            "00" => Self::SelectingApp,
            "01" => Self::WaitingForCard,
            "02" => Self::ReadingCard,
            "03" => Self::Authorizing,
            "09" => Self::Accepted,
            "11" => Self::InsertOrTapCard,
            _ => Self::Unknown,
        }
    }

    /// Snake-case state name, as surfaced to event consumers
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectingApp => "selecting_app",
            Self::WaitingForCard => "waiting_for_card",
            Self::ReadingCard => "reading_card",
            Self::Authorizing => "authorizing",
            Self::Accepted => "accepted",
            Self::InsertOrTapCard => "insert_or_tap_card",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Human-readable message for a result code
pub fn result_message(code: &str) -> String {
    let known = match code {
        "00" => "Transaction approved",
        "01" => "Rejected by authorization host",
        "02" => "Transaction rejected - other reason",
        "03" => "Rejected - cashback not supported",
        "04" => "Rejected - card data transferred to another app",
        "05" => "Rejected - missing daily closure report",
        "06" => "Rejected by incorrect PIN",
        "08" => "Rejected - no consent for partial authorization",
        "20" => "Attempt to void already voided transaction",
        "30" => "Cashier not logged in",
        "80" => "Unauthorized offline void",
        "81" => "Attempt to void a void transaction",
        "82" => "Transaction to void not found",
        "83" => "Void amount mismatch",
        "84" => "Invalid printer parameters",
        "94" => "Transaction type not allowed",
        "95" => "Missing transaction number to void",
        "96" => "Invalid transaction amount",
        "97" => "Invalid transaction type (tag DF01)",
        "98" => "Invalid TLV format",
        "99" => "Invalid message format",
        "DF" => "Terminal rejected packet",
        _ => return format!("Unknown error code: {}", code),
    };

    known.to_string()
}
