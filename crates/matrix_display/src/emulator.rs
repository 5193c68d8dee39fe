//! UDP sink for the network matrix emulator.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use common::{Error, Result, Rgb};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::protocol::{Command, PACKET_SIZE};
use crate::{check_bounds, DisplaySink};

/// Sends every display command to the emulator as one datagram.
#[derive(Debug)]
pub struct EmulatorSink {
    addr: String,
    handshake_timeout: Duration,
    socket: Option<UdpSocket>,
}

impl EmulatorSink {
    pub fn new(addr: impl Into<String>, handshake_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            handshake_timeout,
            socket: None,
        }
    }

    async fn connect(&self) -> Result<UdpSocket> {
        let target: SocketAddr = tokio::net::lookup_host(&self.addr)
            .await
            .map_err(|e| Error::SinkUnavailable(format!("cannot resolve {}: {}", self.addr, e)))?
            .next()
            .ok_or_else(|| Error::SinkUnavailable(format!("no address for {}", self.addr)))?;

        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| Error::SinkUnavailable(format!("bind failed: {e}")))?;
        socket
            .connect(target)
            .await
            .map_err(|e| Error::SinkUnavailable(format!("connect to {target} failed: {e}")))?;

        Ok(socket)
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        let socket = self.socket.as_ref().ok_or_else(|| {
            Error::SinkUnavailable("emulator sink used before init".into())
        })?;
        socket
            .send(&cmd.encode())
            .await
            .map_err(|e| Error::SinkWriteFailure(format!("{:?} to {}: {}", cmd, self.addr, e)))?;
        Ok(())
    }
}

#[async_trait]
impl DisplaySink for EmulatorSink {
    async fn init(&mut self) -> Result<()> {
        let socket = self.connect().await?;

        socket
            .send(&Command::Handshake.encode())
            .await
            .map_err(|e| Error::SinkUnavailable(format!("handshake send failed: {e}")))?;

        let mut buf = [0u8; PACKET_SIZE];
        match timeout(self.handshake_timeout, socket.recv(&mut buf)).await {
            Ok(Ok(n)) => debug!("Emulator handshake reply: {} bytes", n),
            Ok(Err(e)) => {
                return Err(Error::SinkUnavailable(format!("handshake failed: {e}")));
            }
            Err(_) => {
                return Err(Error::SinkUnavailable(format!(
                    "no handshake reply from {} within {:?}",
                    self.addr, self.handshake_timeout
                )));
            }
        }

        info!("Connected to matrix emulator at {}", self.addr);
        self.socket = Some(socket);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        if self.socket.is_none() {
            return Ok(());
        }
        let result = crate::clear(self).await;
        self.socket = None;
        result
    }

    async fn set_brightness(&mut self, level: f32) -> Result<()> {
        self.send(Command::Brightness(level)).await
    }

    async fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) -> Result<()> {
        check_bounds(x, y)?;
        self.send(Command::SetPixel { x, y, color }).await
    }

    async fn present(&mut self) -> Result<()> {
        self.send(Command::Present).await
    }
}
