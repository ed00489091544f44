//! TCP client for HAProxy's runtime API socket.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::admin::{AdminChannel, AdminError};
use crate::config::HaproxyConfig;

/// One short-lived connection per command: connect, write, read a line, close.
#[derive(Debug, Clone)]
pub struct SocketAdminChannel {
    address: String,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl SocketAdminChannel {
    pub fn new(address: impl Into<String>, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
            read_timeout,
        }
    }

    pub fn from_config(config: &HaproxyConfig) -> Self {
        Self::new(config.admin_address(), config.connect_timeout(), config.admin_read_timeout())
    }
}

impl AdminChannel for SocketAdminChannel {
    async fn send(&self, command: &str) -> Result<String, AdminError> {
        let mut stream = timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| AdminError::ConnectTimeout(self.connect_timeout))?
            .map_err(AdminError::Connect)?;

        stream
            .write_all(format!("{}\n", command.trim_end()).as_bytes())
            .await
            .map_err(AdminError::Write)?;

        let mut reader = BufReader::new(stream);
        let mut reply = String::new();
        let read = timeout(self.read_timeout, reader.read_line(&mut reply))
            .await
            .map_err(|_| AdminError::ReadTimeout(self.read_timeout))?
            .map_err(AdminError::Read)?;

        if read == 0 {
            return Err(AdminError::Closed);
        }

        tracing::debug!(address = %self.address, command, "Admin command sent");
        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn one_shot_server(reply: &'static [u8]) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 256];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(reply).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn sends_command_and_reads_one_line() {
        let (addr, server) = one_shot_server(b"Done.\nignored\n").await;
        let channel = SocketAdminChannel::new(addr, Duration::from_secs(1), Duration::from_secs(1));

        let reply = channel.send("clear counters all").await.unwrap();
        assert_eq!(reply, "Done.");
        assert_eq!(server.await.unwrap(), "clear counters all\n");
    }

    #[tokio::test]
    async fn empty_reply_line_is_success() {
        let (addr, _server) = one_shot_server(b"\n").await;
        let channel = SocketAdminChannel::new(addr, Duration::from_secs(1), Duration::from_secs(1));
        assert_eq!(channel.send("clear counters all").await.unwrap(), "");
    }

    #[tokio::test]
    async fn closed_without_reply_is_error() {
        let (addr, _server) = one_shot_server(b"").await;
        let channel = SocketAdminChannel::new(addr, Duration::from_secs(1), Duration::from_secs(1));
        assert!(matches!(channel.send("clear counters all").await, Err(AdminError::Closed)));
    }

    #[tokio::test]
    async fn refused_connection_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let channel = SocketAdminChannel::new(addr, Duration::from_secs(1), Duration::from_secs(1));
        assert!(matches!(channel.send("clear counters all").await, Err(AdminError::Connect(_))));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let channel = SocketAdminChannel::new(addr, Duration::from_secs(1), Duration::from_millis(100));
        assert!(matches!(channel.send("clear counters all").await, Err(AdminError::ReadTimeout(_))));
    }
}
