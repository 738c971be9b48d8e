//! Fake fail2ban daemon.
//!
//! [`FakeDaemon`] listens on a Unix socket inside a temporary directory and
//! answers each command with a canned [`Reply`]. Every decoded request is
//! recorded so tests can assert on what was sent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use f2b_core::codec::{self, CLOSE_COMMAND, COMMAND_TERMINATOR};
use f2b_core::Value;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::replies;

/// What the fake daemon sends back for one command.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Pickle the value and terminate the frame
    Value(Value),
    /// Send these bytes followed by the terminator
    Raw(Vec<u8>),
    /// Send these bytes, then hang up without a terminator
    Partial(Vec<u8>),
    /// Hang up without replying
    Hangup,
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

#[derive(Default)]
struct Journal {
    requests: Vec<String>,
    closes: usize,
}

/// Builder for a [`FakeDaemon`]
#[derive(Default)]
pub struct FakeDaemonBuilder {
    replies: HashMap<String, Reply>,
}

impl FakeDaemonBuilder {
    /// Answer `command` (space-joined, e.g. `"status sshd"`) with `reply`.
    #[must_use]
    pub fn reply(mut self, command: &str, reply: impl Into<Reply>) -> Self {
        self.replies.insert(command.to_string(), reply.into());
        self
    }

    /// Start listening.
    pub async fn spawn(self) -> FakeDaemon {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let socket_path = temp_dir.path().join("fail2ban.sock");
        let listener = UnixListener::bind(&socket_path).expect("failed to bind fake daemon");

        let journal = Arc::new(Mutex::new(Journal::default()));
        let replies = Arc::new(self.replies);

        let handle = tokio::spawn({
            let journal = Arc::clone(&journal);
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve(stream, Arc::clone(&replies), Arc::clone(&journal)));
                }
            }
        });

        FakeDaemon {
            socket_path,
            journal,
            handle,
            _temp_dir: temp_dir,
        }
    }
}

/// A fake daemon bound to a temporary socket.
///
/// The listener is stopped and the socket removed when this value is
/// dropped.
pub struct FakeDaemon {
    socket_path: PathBuf,
    journal: Arc<Mutex<Journal>>,
    handle: JoinHandle<()>,
    _temp_dir: TempDir,
}

impl FakeDaemon {
    /// Start configuring a daemon.
    #[must_use]
    pub fn builder() -> FakeDaemonBuilder {
        FakeDaemonBuilder::default()
    }

    /// A daemon with two jails, `sshd` and `apache`, and fixed counters:
    /// sshd `2/10` failed, `1/5` banned; apache all zero.
    pub async fn two_jails() -> Self {
        Self::builder()
            .reply("ping 100", replies::pong())
            .reply("status", replies::status(&["sshd", "apache"]))
            .reply("status sshd", replies::jail_status(2, 10, 1, 5))
            .reply("status apache", replies::jail_status(0, 0, 0, 0))
            .reply("version", replies::version("1.1.0"))
            .reply("get sshd bantime", replies::int(600))
            .reply("get sshd findtime", replies::int(600))
            .reply("get sshd maxretry", replies::int(5))
            .reply("get apache bantime", replies::int(3600))
            .reply("get apache findtime", replies::int(300))
            .reply("get apache maxretry", replies::int(3))
            .reply(
                "banned",
                replies::banned(&[
                    ("sshd", &["192.0.2.1", "198.51.100.2"]),
                    ("apache", &["192.0.2.1"]),
                ]),
            )
            .spawn()
            .await
    }

    /// Path of the listening socket
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Commands received so far, space-joined, in arrival order
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.journal.lock().expect("journal poisoned").requests.clone()
    }

    /// Number of close frames received
    #[must_use]
    pub fn closes(&self) -> usize {
        self.journal.lock().expect("journal poisoned").closes
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut stream: UnixStream,
    replies: Arc<HashMap<String, Reply>>,
    journal: Arc<Mutex<Journal>>,
) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let Some(end) = find(&buffer, COMMAND_TERMINATOR) else {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            }
            continue;
        };

        let frame: Vec<u8> = buffer.drain(..end + COMMAND_TERMINATOR.len()).collect();
        let frame = &frame[..end];

        if frame == CLOSE_COMMAND {
            journal.lock().expect("journal poisoned").closes += 1;
            return;
        }

        let command = command_text(frame);
        debug!(command = %command, "fake daemon received command");
        journal
            .lock()
            .expect("journal poisoned")
            .requests
            .push(command.clone());

        let reply = replies.get(&command).cloned().unwrap_or_else(|| {
            Reply::Value(replies::error(
                "builtins.Exception",
                &format!("Invalid command {command:?}"),
            ))
        });

        let written = match reply {
            Reply::Value(value) => write_frame(&mut stream, &codec::encode_value(&value)).await,
            Reply::Raw(bytes) => write_frame(&mut stream, &bytes).await,
            Reply::Partial(bytes) => {
                let _ = stream.write_all(&bytes).await;
                return;
            }
            Reply::Hangup => return,
        };
        if written.is_err() {
            return;
        }
    }
}

async fn write_frame(stream: &mut UnixStream, payload: &[u8]) -> std::io::Result<()> {
    stream.write_all(payload).await?;
    stream.write_all(COMMAND_TERMINATOR).await
}

/// Decode a request frame back into its space-joined command.
fn command_text(frame: &[u8]) -> String {
    match codec::decode(frame) {
        Ok(Value::List(parts)) => parts
            .iter()
            .map(|part| part.as_str().unwrap_or("?"))
            .collect::<Vec<_>>()
            .join(" "),
        Ok(other) => format!("<not a command: {other}>"),
        Err(error) => format!("<undecodable: {error}>"),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
