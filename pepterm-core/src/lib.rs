//! # pepterm-core
//!
//! Protocol primitives for PeP payment terminals.
//!
//! This crate provides the low-level pieces shared by the register-side
//! session:
//! - Frame structure and encoding/decoding
//! - LRC checksum
//! - TLV field and amount codecs
//! - Progress and result code tables
//!
//! No I/O happens here; transport and session logic live in their own
//! crates.

pub mod checksum;
pub mod codes;
pub mod constants;
pub mod error;
pub mod frame;
pub mod header;
pub mod tlv;

pub use codes::ProgressStatus;
pub use constants::RequestFlags;
pub use error::{Error, Result};
pub use frame::Frame;
pub use header::{Direction, FrameKind};

/// Default register-side UDP port
pub const DEFAULT_LOCAL_PORT: u16 = 5000;

/// Default terminal-side UDP port
pub const DEFAULT_TERMINAL_PORT: u16 = 5010;
