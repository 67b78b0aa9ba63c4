//! Terminal identifier

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Eight-digit terminal identifier used during binding and discovery
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tid(String);

impl Tid {
    /// Required identifier length
    pub const LEN: usize = 8;

    /// Validate and wrap a terminal identifier
    pub fn new(tid: impl Into<String>) -> Result<Self> {
        let tid = tid.into();
        if tid.len() != Self::LEN || !tid.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Validation(format!(
                "TID must be exactly {} decimal digits, got {:?}",
                Self::LEN,
                tid
            )));
        }
        Ok(Self(tid))
    }

    /// The identifier digits
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Tid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
