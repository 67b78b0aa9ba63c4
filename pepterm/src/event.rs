//! Session events
//!
//! Every inbound progress report, final result, and local cancellation is
//! pushed over the channel returned by `TerminalSession::connect`. Events
//! carry a snapshot of the transaction taken right after the change was
//! applied, so consumers never race the session for state.

use chrono::{DateTime, Utc};

use pepterm_core::ProgressStatus;
use pepterm_types::Transaction;

/// One observed change to the transaction in flight
#[derive(Debug, Clone)]
pub struct TerminalEvent {
    /// When the change was observed
    pub at: DateTime<Utc>,

    /// Transaction snapshot after applying the change
    pub transaction: Transaction,

    /// What changed
    pub detail: EventDetail,
}

/// Payload of a [`TerminalEvent`]
#[derive(Debug, Clone)]
pub enum EventDetail {
    /// Terminal reported payment progress
    Progress {
        status: ProgressStatus,
        code: String,
    },

    /// Terminal delivered the final result. Always the last event for a
    /// transaction; progress arriving afterwards is dropped.
    Result {
        success: bool,
        code: String,
        /// Failure reason, absent on success
        message: Option<String>,
    },

    /// Transaction was cancelled locally
    Cancelled,
}

/// Discriminant of [`EventDetail`], for filtering without destructuring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Progress,
    Result,
    Cancelled,
}

impl TerminalEvent {
    pub fn kind(&self) -> EventKind {
        match self.detail {
            EventDetail::Progress { .. } => EventKind::Progress,
            EventDetail::Result { .. } => EventKind::Result,
            EventDetail::Cancelled => EventKind::Cancelled,
        }
    }
}
