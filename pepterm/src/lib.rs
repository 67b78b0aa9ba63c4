//! # pepterm
//!
//! Cash register to PeP payment terminal bridge over the terminal's
//! proprietary UDP protocol: broadcast discovery and binding, framed
//! payment requests, and asynchronous progress and result reports.
//!
//! ## Features
//!
//! - Terminal discovery and binding by eight-digit identifier, with an
//!   optional fallback address when no terminal answers
//! - Payment requests carrying operator code, order description and a
//!   tracking identifier
//! - Typed progress, result and cancellation events on a channel
//! - Local cancellation and session status snapshots
//! - Test mode for exercising register integrations without an acquirer
//!
//! ## Quick Start
//!
//! ```no_run
//! use pepterm::{EventDetail, PaymentRequest, SessionConfig, TerminalSession};
//!
//! #[tokio::main]
//! async fn main() -> pepterm::Result<()> {
//!     let (session, mut events) =
//!         TerminalSession::connect(SessionConfig::from_env()).await?;
//!
//!     let binding = session.bind_terminal("12345678").await?;
//!     println!("Bound terminal {} at {}", binding.tid, binding.ip);
//!
//!     session
//!         .send_payment(PaymentRequest::new(25.00, "ORDER-1"))
//!         .await?;
//!
//!     while let Some(event) = events.recv().await {
//!         match event.detail {
//!             EventDetail::Progress { status, .. } => println!("progress: {}", status),
//!             EventDetail::Result { success, code, .. } => {
//!                 println!("result: {} (code {})", success, code);
//!                 break;
//!             }
//!             EventDetail::Cancelled => break,
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod session;

// Re-exports
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use event::{EventDetail, EventKind, TerminalEvent};
pub use session::TerminalSession;

// Re-export protocol and domain types
pub use pepterm_core::ProgressStatus;
pub use pepterm_types::{
    BindOutcome, CancelOutcome, PaymentRequest, PaymentStarted, ResultFields, StatusReport,
    TerminalBinding, Tid, Transaction, TransactionStatus,
};
