//! UDP transport
//!
//! One broadcast-enabled socket bound to the register's local port. A
//! background task forwards every inbound datagram over the channel
//! returned by [`UdpTransport::bind`]; the task stops when the transport
//! shuts down or the receiver side is dropped.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::{Datagram, Transport, error::*};

/// Inbound datagram channel depth
const CHANNEL_CAPACITY: usize = 64;

/// Receive buffer size; PeP frames are far smaller
const MAX_DATAGRAM_SIZE: usize = 2048;

/// UDP transport for PeP terminals
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    broadcast_addr: IpAddr,
    recv_task: Mutex<Option<JoinHandle<()>>>,
}

impl UdpTransport {
    /// Bind the local socket and start the receive loop
    ///
    /// `local_port` may be zero to let the OS pick; [`Transport::local_addr`]
    /// reports the effective port. Broadcast is enabled on the socket so
    /// binding discovery can reach terminals with unknown addresses.
    ///
    /// # Errors
    ///
    /// `SocketInit` if the socket cannot be bound or configured.
    pub async fn bind(
        local_port: u16,
        broadcast_addr: IpAddr,
    ) -> Result<(Self, mpsc::Receiver<Datagram>)> {
        let socket = UdpSocket::bind(("0.0.0.0", local_port))
            .await
            .map_err(Error::SocketInit)?;
        socket.set_broadcast(true).map_err(Error::SocketInit)?;

        let local = socket.local_addr().map_err(Error::SocketInit)?;
        info!("UDP socket listening on port {}", local.port());

        let socket = Arc::new(socket);
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let recv_task = tokio::spawn(recv_loop(Arc::clone(&socket), tx));

        let transport = Self {
            socket,
            broadcast_addr,
            recv_task: Mutex::new(Some(recv_task)),
        };

        Ok((transport, rx))
    }

    /// Stop the receive loop
    ///
    /// Idempotent; also runs on drop. The socket itself closes once the
    /// stopped loop releases its handle, so teardown happens exactly once
    /// no matter how shutdown is reached.
    pub fn shutdown(&self) {
        if let Some(task) = self.recv_task.lock().take() {
            task.abort();
            debug!("UDP receive loop stopped");
        }
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_to(&self, data: &[u8], peer: SocketAddr) -> Result<()> {
        trace!(
            "Sending {} bytes to {}: {:02X?}",
            data.len(),
            peer,
            &data[..data.len().min(32)]
        );

        self.socket
            .send_to(data, peer)
            .await
            .map_err(|source| Error::Send { peer, source })?;

        Ok(())
    }

    async fn broadcast(&self, data: &[u8], port: u16) -> Result<()> {
        let peer = SocketAddr::new(self.broadcast_addr, port);
        debug!("Broadcasting {} bytes to {}", data.len(), peer);

        self.send_to(data, peer).await
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

async fn recv_loop(socket: Arc<UdpSocket>, tx: mpsc::Sender<Datagram>) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((n, peer)) => {
                trace!(
                    "Received {} bytes from {}: {:02X?}",
                    n,
                    peer,
                    &buf[..n.min(32)]
                );

                let datagram = Datagram {
                    payload: Bytes::copy_from_slice(&buf[..n]),
                    peer,
                };
                if tx.send(datagram).await.is_err() {
                    debug!("Datagram receiver dropped, stopping receive loop");
                    break;
                }
            }
            Err(e) => {
                // Transient faults (e.g. ICMP unreachable surfacing here)
                // must not kill the listener
                warn!("Receive error: {}", e);
            }
        }
    }
}

/// Best-effort local IPv4 discovery
///
/// Connects a throwaway socket toward `probe` so the OS picks the outbound
/// interface; no datagram is actually sent. Falls back to the loopback
/// address when the route cannot be resolved.
pub async fn local_ipv4_hint(probe: SocketAddr) -> Ipv4Addr {
    match probe_route(probe).await {
        Ok(IpAddr::V4(ip)) if !ip.is_unspecified() => ip,
        _ => Ipv4Addr::LOCALHOST,
    }
}

async fn probe_route(probe: SocketAddr) -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.set_broadcast(true)?;
    socket.connect(probe).await?;
    Ok(socket.local_addr()?.ip())
}
