//! High-level error types

use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Protocol error: {0}")]
    Protocol(#[from] pepterm_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] pepterm_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] pepterm_types::Error),

    #[error("Terminal not bound")]
    NotBound,

    #[error("No active transaction")]
    NoActiveTransaction,

    #[error("Invalid payment amount: {0}")]
    InvalidAmount(f64),

    #[error("Invalid terminal id: {0:?}")]
    InvalidTid(String),

    #[error("Session is shut down")]
    NotReady,

    #[error("Terminal binding already in progress")]
    BindInProgress,

    #[error("No binding acknowledgment within {0:?}")]
    BindTimeout(Duration),

    #[error("Transaction {0} still in progress")]
    TransactionInProgress(String),

    #[error("Unknown message header: {0}")]
    UnknownHeader(String),
}
