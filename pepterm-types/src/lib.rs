//! Type definitions for pepterm

pub mod binding;
pub mod error;
pub mod payment;
pub mod report;
pub mod tid;
pub mod transaction;

pub use binding::TerminalBinding;
pub use error::{Error, Result};
pub use payment::PaymentRequest;
pub use report::{BindOutcome, CancelOutcome, PaymentStarted, StatusReport};
pub use tid::Tid;
pub use transaction::{ResultFields, Transaction, TransactionStatus};
