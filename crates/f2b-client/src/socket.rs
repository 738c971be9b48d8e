//! Connection to the fail2ban control socket.

use f2b_core::codec::{self, CLOSE_COMMAND, COMMAND_TERMINATOR};
use f2b_core::{Fail2BanError, Result, Value};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

/// Read buffer size for replies
const READ_CHUNK: usize = 4096;

/// One connection to the fail2ban daemon.
///
/// Commands are sent one at a time; each call writes a single frame and
/// reads a single reply. The stream is released when the socket is
/// dropped, [`close`](Self::close) additionally tells the daemon first.
#[derive(Debug)]
pub struct Fail2BanSocket {
    stream: UnixStream,
    path: PathBuf,
}

impl Fail2BanSocket {
    /// Dial the daemon.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "connecting to fail2ban socket");

        let stream = UnixStream::connect(path)
            .await
            .map_err(|source| Fail2BanError::Connection {
                command: "connect".to_string(),
                source,
            })?;

        Ok(Self {
            stream,
            path: path.to_path_buf(),
        })
    }

    /// Path this socket was dialled on
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Send one command and decode the reply.
    ///
    /// I/O failures, including the daemon hanging up before replying, are
    /// [`Fail2BanError::Connection`]. A reply cut short after some bytes
    /// arrived is passed to the decoder and surfaces as
    /// [`Fail2BanError::Decode`].
    pub async fn send_command(&mut self, parts: &[&str]) -> Result<Value> {
        let command = parts.join(" ");
        debug!(command = %command, "sending command");

        let connection_error = |source: io::Error| Fail2BanError::Connection {
            command: command.clone(),
            source,
        };

        let mut frame = codec::encode_command(parts);
        frame.extend_from_slice(COMMAND_TERMINATOR);
        self.stream
            .write_all(&frame)
            .await
            .map_err(connection_error)?;

        let reply = self.read_frame().await.map_err(connection_error)?;
        debug!(command = %command, bytes = reply.len(), "received reply");

        codec::decode(&reply).map_err(|source| Fail2BanError::Decode {
            command: command.clone(),
            source,
        })
    }

    /// Read up to the terminator and strip it.
    async fn read_frame(&mut self) -> io::Result<Vec<u8>> {
        let mut reply = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                if reply.is_empty() {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed by daemon",
                    ));
                }
                return Ok(reply);
            }
            reply.extend_from_slice(&chunk[..n]);
            if reply.ends_with(COMMAND_TERMINATOR) {
                reply.truncate(reply.len() - COMMAND_TERMINATOR.len());
                return Ok(reply);
            }
        }
    }

    /// Say goodbye to the daemon and shut the stream down.
    ///
    /// Failures are ignored: the daemon may already be gone.
    pub async fn close(mut self) {
        let mut frame = CLOSE_COMMAND.to_vec();
        frame.extend_from_slice(COMMAND_TERMINATOR);
        if let Err(error) = self.stream.write_all(&frame).await {
            debug!(error = %error, "failed to send close command");
        }
        if let Err(error) = self.stream.shutdown().await {
            debug!(error = %error, "failed to shut down socket");
        }
    }
}
