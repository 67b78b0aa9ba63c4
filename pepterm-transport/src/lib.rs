//! Datagram transport for the PeP protocol
//!
//! Owns the UDP socket and nothing else: outbound bytes go out via
//! [`Transport`], inbound datagrams come back over a bounded channel handed
//! out at construction. No protocol interpretation happens in this crate.

pub mod error;
pub mod udp;

pub use error::{Error, Result};
pub use udp::{UdpTransport, local_ipv4_hint};

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;

/// One received datagram and where it came from
#[derive(Debug, Clone)]
pub struct Datagram {
    /// Raw payload bytes
    pub payload: Bytes,

    /// Sender address
    pub peer: SocketAddr,
}

/// Datagram send operations
///
/// Receiving is not part of the trait: implementations deliver inbound
/// datagrams through the channel they hand out when constructed.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a datagram to a specific peer
    async fn send_to(&self, data: &[u8], peer: SocketAddr) -> Result<()>;

    /// Send a datagram to the configured broadcast address on `port`
    async fn broadcast(&self, data: &[u8], port: u16) -> Result<()>;

    /// Local address the socket is bound to
    fn local_addr(&self) -> Result<SocketAddr>;
}
