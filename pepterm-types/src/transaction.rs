//! Transaction lifecycle types

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Lifecycle status of a payment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Payment request sent, nothing heard back yet
    Pending,
    /// At least one progress report arrived
    InProgress,
    /// Terminal approved the transaction
    Success,
    /// Terminal rejected the transaction
    Failed,
    /// Cancelled locally; the terminal is not informed
    Cancelled,
}

impl TransactionStatus {
    /// Whether this status ends the transaction lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// Decoded result fields, known tags extracted and the rest preserved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultFields {
    /// Terminal-assigned transaction number (STAN)
    pub transaction_number: Option<String>,

    /// Authorization code
    pub auth_code: Option<String>,

    /// Masked card number
    pub masked_pan: Option<String>,

    /// Confirmed amount in major currency units
    pub amount_confirmed: Option<f64>,

    /// Unrecognized tags, kept verbatim
    pub other: BTreeMap<String, String>,
}

impl ResultFields {
    /// Whether any field was decoded at all
    pub fn is_empty(&self) -> bool {
        self.transaction_number.is_none()
            && self.auth_code.is_none()
            && self.masked_pan.is_none()
            && self.amount_confirmed.is_none()
            && self.other.is_empty()
    }
}

/// The unit of work for one payment attempt
///
/// Created by `send_payment`, mutated in place by inbound progress and
/// result frames and by local cancellation, replaced by the next
/// `send_payment`. Exactly one transaction is live per session at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Caller-supplied opaque identifier
    pub id: String,

    /// Amount in major currency units
    pub amount: f64,

    /// Lifecycle status
    pub status: TransactionStatus,

    /// Last progress code received from the terminal
    pub progress_code: Option<String>,

    /// Result code received from the terminal
    pub result_code: Option<String>,

    /// Failure reason, set only for failed results
    pub error_message: Option<String>,

    /// Decoded result fields
    pub fields: ResultFields,

    /// When the payment request was sent
    pub started_at: DateTime<Utc>,

    /// When a result or cancellation ended the transaction
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Start a new pending transaction
    pub fn new(id: impl Into<String>, amount: f64) -> Self {
        Self {
            id: id.into(),
            amount,
            status: TransactionStatus::Pending,
            progress_code: None,
            result_code: None,
            error_message: None,
            fields: ResultFields::default(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Whether the transaction still accepts progress updates
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction[{}]({}, amount={:.2})",
            self.id, self.status, self.amount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction_is_pending() {
        let txn = Transaction::new("TXN-1", 25.00);

        assert_eq!(txn.status, TransactionStatus::Pending);
        assert!(txn.is_active());
        assert!(txn.completed_at.is_none());
        assert!(txn.fields.is_empty());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(!TransactionStatus::InProgress.is_terminal());
        assert!(TransactionStatus::Success.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TransactionStatus::InProgress.to_string(), "in_progress");
        assert_eq!(TransactionStatus::Cancelled.to_string(), "cancelled");
    }
}
