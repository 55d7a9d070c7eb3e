//! Tokio runtime adapter

use std::io::ErrorKind;

use tokio::io::unix::AsyncFd;

use super::receive::{KernelTimestamps, ReceiveStrategy, Reception, RecvMode};
use super::socket::PtpSocket;
use super::timestamping::TimestampedSocket;
use crate::error::{Result, SocketError};
use crate::types::Address;

/// A configured timestamping socket driven by the tokio reactor.
///
/// Normal receives wait for readiness instead of blocking the thread.
/// Transmit timestamp reads keep their short, bounded `poll` on the error
/// queue.
#[derive(Debug)]
pub struct AsyncTimestampedSocket<R = KernelTimestamps> {
    inner: AsyncFd<TimestampedSocket<PtpSocket, R>>,
}

impl<R: ReceiveStrategy<PtpSocket>> AsyncTimestampedSocket<R> {
    /// Register a configured socket with the current runtime.
    ///
    /// # Errors
    /// [`SocketError::Resource`] if the descriptor cannot be made
    /// non-blocking or registered.
    pub fn new(socket: TimestampedSocket<PtpSocket, R>) -> Result<Self> {
        socket
            .io()
            .set_nonblocking(true)
            .map_err(|source| SocketError::Resource {
                op: "fcntl",
                source,
            })?;
        let inner = AsyncFd::new(socket).map_err(|source| SocketError::Resource {
            op: "epoll register",
            source,
        })?;
        Ok(Self { inner })
    }

    /// Wait for and receive the next packet.
    ///
    /// # Errors
    /// As [`TimestampedSocket::receive`].
    pub async fn receive(
        &mut self,
        buf: &mut [u8],
        mut addr: Option<&mut Address>,
    ) -> Result<Reception> {
        loop {
            let mut guard = self.inner.readable_mut().await.map_err(SocketError::Poll)?;
            match guard
                .get_inner_mut()
                .receive(buf, addr.as_deref_mut(), RecvMode::Normal)
            {
                Err(SocketError::Receive { source, .. }) if source.kind() == ErrorKind::WouldBlock => {
                    guard.clear_ready();
                }
                res => return res,
            }
        }
    }

    /// Read the transmit timestamp of the last sent event message.
    ///
    /// # Errors
    /// As [`TimestampedSocket::receive`] in error-queue mode.
    pub fn recv_tx_timestamp(&mut self, buf: &mut [u8]) -> Result<Reception> {
        self.inner.get_mut().receive(buf, None, RecvMode::ErrorQueue)
    }

    /// The wrapped socket.
    pub fn get_ref(&self) -> &TimestampedSocket<PtpSocket, R> {
        self.inner.get_ref()
    }

    /// The wrapped socket, mutably.
    pub fn get_mut(&mut self) -> &mut TimestampedSocket<PtpSocket, R> {
        self.inner.get_mut()
    }

    /// Deregister and return the wrapped socket.
    pub fn into_inner(self) -> TimestampedSocket<PtpSocket, R> {
        self.inner.into_inner()
    }
}
