//! Terminal binding record

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::tid::Tid;

/// Where a bound terminal lives on the network
///
/// Set by a successful (or fallback) bind, overwritten by the next one.
/// Absence of a binding blocks all payment operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalBinding {
    /// Terminal identifier the binding was requested for
    pub tid: Tid,

    /// Terminal address
    pub ip: IpAddr,

    /// Terminal UDP port
    pub port: u16,

    /// When the binding was established
    pub bound_at: DateTime<Utc>,

    /// True when discovery timed out and the configured fallback address
    /// was used instead of a real acknowledgment
    pub fallback: bool,
}

impl fmt::Display for TerminalBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.tid, self.ip, self.port)?;
        if self.fallback {
            write!(f, " (fallback)")?;
        }
        Ok(())
    }
}
