//! SSH transport, built on `russh`.
//!
//! Implements the connector and session traits over an SSH2 exec channel.
//! Command output arrives as raw byte chunks; `LineBuffer` reassembles
//! lines so the log sees them the way a terminal would.

use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key;

use crate::config::{HostKeyPolicy, KeySource, RemoteTarget};
use crate::error::DeployError;
use crate::log::CommandLog;
use crate::remote::{RemoteConnector, RemoteSession};
use crate::types::{CommandOutcome, CommandStep};

/// SSH implementation of [`RemoteConnector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

impl SshConnector {
    pub fn new() -> Self {
        Self
    }
}

impl RemoteConnector for SshConnector {
    type Session = SshSession;

    async fn open(&self, target: &RemoteTarget) -> Result<SshSession, DeployError> {
        let keypair = load_key(&target.key, target.key_passphrase.as_deref())?;

        let config = Arc::new(client::Config::default());
        let handler = ClientHandler {
            host: target.host.clone(),
            port: target.port,
            policy: target.host_keys,
        };

        let mut handle = client::connect(config, (target.host.as_str(), target.port), handler)
            .await
            .map_err(|e| {
                DeployError::Connection(format!(
                    "connect to {}:{} failed: {e}",
                    target.host, target.port
                ))
            })?;

        let authenticated = handle
            .authenticate_publickey(target.user.as_str(), Arc::new(keypair))
            .await
            .map_err(|e| DeployError::Connection(format!("publickey auth failed: {e}")))?;

        if !authenticated {
            // Nobody owns the handle after the error returns, so tear the
            // transport down here rather than leak a half-open connection.
            let _ = handle
                .disconnect(Disconnect::ByApplication, "", "English")
                .await;
            return Err(DeployError::Connection(format!(
                "publickey auth rejected for user '{}'",
                target.user
            )));
        }

        tracing::debug!(host = %target.host, user = %target.user, "ssh session established");
        Ok(SshSession {
            handle: Some(handle),
            host: target.host.clone(),
        })
    }
}

/// One authenticated SSH connection.
///
/// Created by [`SshConnector::open`]; each command runs on its own exec
/// channel over the shared transport.
pub struct SshSession {
    // Taken on close so a second close is a no-op.
    handle: Option<Handle<ClientHandler>>,
    host: String,
}

impl RemoteSession for SshSession {
    async fn run(
        &mut self,
        step: &CommandStep,
        log: &dyn CommandLog,
    ) -> Result<CommandOutcome, DeployError> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| DeployError::Command("session already closed".to_string()))?;

        let mut channel = handle
            .channel_open_session()
            .await
            .map_err(|e| DeployError::Command(format!("failed to open exec channel: {e}")))?;

        channel
            .exec(true, step.command.as_str())
            .await
            .map_err(|e| {
                DeployError::Command(format!("failed to dispatch '{}': {e}", step.description))
            })?;

        let mut buffer = LineBuffer::new();
        let mut exit_status = None;

        // Drain the channel until the server closes it. Output can keep
        // arriving after the exit status message.
        loop {
            let Some(msg) = channel.wait().await else {
                break;
            };
            match msg {
                ChannelMsg::Data { ref data } => buffer.push(data, log),
                ChannelMsg::ExtendedData { ref data, .. } => buffer.push(data, log),
                ChannelMsg::ExitStatus {
                    exit_status: status,
                } => exit_status = Some(status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    return Err(DeployError::Command(format!(
                        "'{}' killed by signal {:?}",
                        step.description, signal_name
                    )));
                }
                _ => {}
            }
        }

        buffer.flush(log);

        match exit_status {
            Some(status) => Ok(CommandOutcome::new(status, buffer.into_lines())),
            None => Err(DeployError::Command(format!(
                "channel closed without an exit status for '{}'",
                step.description
            ))),
        }
    }

    async fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            match handle
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
            {
                Ok(()) => tracing::info!(host = %self.host, "disconnected from remote host"),
                Err(e) => tracing::warn!(host = %self.host, error = %e, "ssh disconnect failed"),
            }
        }
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        // Backstop for sessions leaked without close(). Disconnecting needs
        // an async context, so hand it to the runtime if one is still up.
        if let Some(handle) = self.handle.take() {
            tracing::warn!(host = %self.host, "ssh session dropped without close");
            if let Ok(rt) = tokio::runtime::Handle::try_current() {
                rt.spawn(async move {
                    let _ = handle
                        .disconnect(Disconnect::ByApplication, "", "English")
                        .await;
                });
            }
        }
    }
}

/// russh client event handler. Host key verification is the only event
/// this crate cares about.
struct ClientHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.policy {
            HostKeyPolicy::TrustFirstUse => Ok(true),
            HostKeyPolicy::RejectUnknown => {
                // A missing or mismatched known_hosts entry counts as
                // unknown, as does any trouble reading the file.
                let known = russh_keys::check_known_hosts(&self.host, self.port, server_public_key)
                    .unwrap_or(false);
                if !known {
                    tracing::warn!(host = %self.host, "rejecting unverified host key");
                }
                Ok(known)
            }
        }
    }
}

fn load_key(source: &KeySource, passphrase: Option<&str>) -> Result<key::KeyPair, DeployError> {
    match source {
        KeySource::Path(path) => russh_keys::load_secret_key(path, passphrase).map_err(|e| {
            DeployError::Connection(format!("failed to load key {}: {e}", path.display()))
        }),
        KeySource::Pem(pem) => russh_keys::decode_secret_key(pem, passphrase)
            .map_err(|e| DeployError::Connection(format!("failed to decode key: {e}"))),
    }
}

/// Reassembles a byte stream into lines.
///
/// Chunks arrive mid-line, and any of `\n`, `\r\n`, or a bare `\r` ends a
/// line. The bare `\r` case matters for progress output (docker pulls, git
/// counters) that redraws in place; without it those updates pile up into
/// one giant line until end of stream. Completed lines go to the log as
/// they appear; a trailing unterminated fragment is flushed at end of
/// stream.
struct LineBuffer {
    pending: Vec<u8>,
    lines: Vec<String>,
    last_was_cr: bool,
}

impl LineBuffer {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
            lines: Vec::new(),
            last_was_cr: false,
        }
    }

    fn push(&mut self, chunk: &[u8], log: &dyn CommandLog) {
        for &byte in chunk {
            match byte {
                b'\r' => {
                    self.complete(log);
                    self.last_was_cr = true;
                }
                // The `\n` of a CRLF pair; its `\r` already ended the line.
                // The flag survives chunk boundaries.
                b'\n' if self.last_was_cr => self.last_was_cr = false,
                b'\n' => self.complete(log),
                _ => {
                    self.pending.push(byte);
                    self.last_was_cr = false;
                }
            }
        }
    }

    fn flush(&mut self, log: &dyn CommandLog) {
        if !self.pending.is_empty() {
            self.complete(log);
        }
    }

    fn into_lines(self) -> Vec<String> {
        self.lines
    }

    fn complete(&mut self, log: &dyn CommandLog) {
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        log.record(&line);
        self.lines.push(line);
        self.pending.clear();
    }
}
