//! UDP message dispatch service
//!
//! Delivers the test message to the engine's input listener: one datagram
//! per line, in original order, from a socket bound to a fixed local port
//! for the duration of the call. Delivery is fire-and-forget; success is
//! inferred only from the local send calls succeeding.

use std::net::{Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::error::{PipelineError, PipelineResult};
use crate::traits::MessageDispatcher;
use crate::types::RetryPolicy;

/// Dispatcher backed by a real loopback UDP socket.
pub struct RealMessageDispatcher {
    local_port: u16,
    engine_addr: SocketAddr,
    retry: RetryPolicy,
}

impl RealMessageDispatcher {
    pub fn new(local_port: u16, input_port: u16, retry: RetryPolicy) -> Self {
        Self {
            local_port,
            engine_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, input_port)),
            retry,
        }
    }

    /// One delivery attempt. A failed line aborts the attempt immediately;
    /// retry restarts from the first line since the message is small and
    /// idempotent from the engine's point of view.
    async fn send_lines(&self, socket: &UdpSocket, lines: &[&str]) -> std::io::Result<()> {
        for line in lines {
            socket.send_to(line.as_bytes(), self.engine_addr).await?;
        }
        Ok(())
    }

    fn dispatch_error(&self, cause: impl std::fmt::Display) -> PipelineError {
        PipelineError::Dispatch {
            target: self.engine_addr.to_string(),
            cause: cause.to_string(),
        }
    }
}

#[async_trait]
impl MessageDispatcher for RealMessageDispatcher {
    async fn dispatch(&self, message: &str) -> PipelineResult<()> {
        let lines: Vec<&str> = message.split('\n').collect();

        // Scoped socket: released on every exit path when dropped.
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, self.local_port))
            .await
            .map_err(|e| self.dispatch_error(e))?;

        self.retry
            .run(|| self.send_lines(&socket, &lines))
            .await
            .map_err(|e| self.dispatch_error(e))?;

        tracing::debug!("dispatched {} line(s) to {}", lines.len(), self.engine_addr);
        Ok(())
    }
}
