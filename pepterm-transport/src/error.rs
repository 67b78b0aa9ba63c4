//! Transport errors

use std::io;
use std::net::SocketAddr;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket could not be bound or configured; fatal to startup
    #[error("Socket init failed: {0}")]
    SocketInit(#[source] io::Error),

    /// A datagram could not be handed to the OS
    #[error("Send to {peer} failed: {source}")]
    Send {
        peer: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Any other socket fault
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
