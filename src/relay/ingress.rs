//! # UDP Ingress
//!
//! Receives telemetry datagrams from the receiver.
//!
//! UDP is fire-and-forget: no acknowledgment, no fragmentation handling.
//! Datagrams larger than the receive buffer are truncated by the OS and
//! will fail to decode.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::net::UdpSocket;
use tracing::info;

use crate::error::{RelayError, Result};

/// Trait for datagram sources, to enable testing the relay loop
#[async_trait]
pub trait DatagramSource: Send {
    /// Wait for the next datagram and its sender
    async fn recv_datagram(&mut self) -> io::Result<(Bytes, SocketAddr)>;
}

/// Datagram source backed by a bound tokio UDP socket
#[derive(Debug)]
pub struct UdpIngress {
    socket: UdpSocket,
    buffer: BytesMut,
    max_datagram_size: usize,
}

impl UdpIngress {
    /// Bind the ingress socket
    ///
    /// # Arguments
    ///
    /// * `addr` - Local address, e.g. `0.0.0.0:44333`
    /// * `max_datagram_size` - Receive buffer size in bytes
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Transport`] if the socket cannot be bound
    pub async fn bind(addr: &str, max_datagram_size: usize) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| RelayError::Transport {
                endpoint: format!("udp://{}", addr),
                source,
            })?;

        info!("UDP ingress listening on {}", socket.local_addr()?);

        Ok(Self {
            socket,
            buffer: BytesMut::with_capacity(max_datagram_size),
            max_datagram_size,
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl DatagramSource for UdpIngress {
    async fn recv_datagram(&mut self) -> io::Result<(Bytes, SocketAddr)> {
        self.buffer.clear();
        self.buffer.reserve(self.max_datagram_size);
        let (_, peer) = self.socket.recv_buf_from(&mut self.buffer).await?;
        Ok((self.buffer.split().freeze(), peer))
    }
}
