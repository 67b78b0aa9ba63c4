//! Operation outcomes returned to the control layer

use std::net::IpAddr;

use crate::tid::Tid;
use crate::transaction::Transaction;

/// Result of a terminal bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOutcome {
    /// Terminal identifier that was bound
    pub tid: Tid,

    /// Address the terminal answered from, or the configured fallback
    pub ip: IpAddr,

    /// True when no acknowledgment arrived and the fallback address was
    /// used; operators must be able to tell this apart from real discovery
    pub fallback: bool,
}

/// Acknowledgment that a payment request was handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStarted {
    /// Always true when returned; kept as a field for control layers that
    /// serialize the outcome
    pub accepted: bool,

    /// Identifier of the transaction now pending
    pub transaction_id: String,
}

/// Acknowledgment of a local cancellation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    /// Identifier of the cancelled transaction
    pub transaction_id: String,
}

/// Snapshot of session state for the control layer
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    /// Socket is bound and the session accepts operations
    pub ready: bool,

    /// A terminal binding exists
    pub bound: bool,

    /// Bound terminal address, when bound
    pub terminal_ip: Option<IpAddr>,

    /// Bound terminal identifier, when bound
    pub terminal_tid: Option<Tid>,

    /// Current transaction, live or completed
    pub transaction: Option<Transaction>,
}
