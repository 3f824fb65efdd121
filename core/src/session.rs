/*
 * session.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Portalettere, an asynchronous IMAP client engine.
 *
 * Portalettere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Portalettere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Portalettere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! IMAP session: issues commands, correlates responses, drives
//! continuation sub-dialogs and the session state machine. All socket
//! traffic runs on one spawned pipeline task (tokio::select over the
//! outbound channel and inbound bytes); callers on any task issue
//! commands and get back completion handles immediately. A tag is always
//! registered before its bytes can reach the wire, so a response can
//! never arrive for an unknown-but-ours tag.

use std::sync::{Arc, Mutex, RwLock};

use bytes::{Bytes, BytesMut};
use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::capability::Capability;
use crate::command::{
    AppendCommand, AuthOauthBearerCommand, AuthXOauth2Command, CreateCommand, FetchCommand,
    ImapCommand, ImapCommandType, LoginCommand, RawCommand, SelectCommand, StatusCommand,
};
use crate::error::ImapError;
use crate::net;
use crate::registry::{CompletionHandle, ResponseRegistry, TagAllocator, UntaggedStream};
use crate::response::{classify_line, take_frame, ImapResponse, ResponseStatus};

/// High-level protocol phase of the session. Owned by the session and
/// mutated only on command issuance and tagged completion events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Authenticating,
    Authenticated,
    Selected,
    Idling,
    LoggingOut,
    Closed,
}

/// Which commands may be issued from which state. Checked before any
/// bytes are written; an illegal command fails fast instead of being
/// bounced by the server.
fn command_legal(state: SessionState, ct: ImapCommandType) -> bool {
    use SessionState::*;
    match ct {
        ImapCommandType::Logout => !matches!(state, Disconnected | Closed),
        ImapCommandType::Capability | ImapCommandType::Noop | ImapCommandType::Raw => {
            matches!(state, Connected | Authenticated | Selected)
        }
        ImapCommandType::Login | ImapCommandType::Authenticate => matches!(state, Connected),
        ImapCommandType::Select => matches!(state, Authenticated | Selected),
        ImapCommandType::Status | ImapCommandType::Create | ImapCommandType::Append => {
            matches!(state, Authenticated | Selected)
        }
        ImapCommandType::Fetch => matches!(state, Selected),
        ImapCommandType::Idle => matches!(state, Selected),
    }
}

/// Writes handed to the pipeline task.
enum Outbound {
    /// Initial line of a registered command.
    Command {
        tag: String,
        line: Bytes,
        sensitive: bool,
        summary: String,
    },
    /// Client-initiated terminator for the streaming command (DONE).
    Terminate { line: Bytes },
}

struct SessionInner {
    registry: ResponseRegistry,
    tags: TagAllocator,
    state: Mutex<SessionState>,
    capabilities: RwLock<Capability>,
    /// Tag of the outstanding IDLE command, for DONE.
    idle_tag: Mutex<Option<String>>,
}

/// Handle to one IMAP session. Cheaply cloneable; all clones share the
/// same connection and tag space. The pipeline task shuts down when the
/// transport closes or every session handle is gone.
#[derive(Clone)]
pub struct ImapSession {
    inner: Arc<SessionInner>,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
}

impl ImapSession {
    /// Connect over TCP (optionally implicit TLS) and start the pipeline.
    pub async fn connect(host: &str, port: u16, implicit_tls: bool) -> Result<Self, ImapError> {
        if implicit_tls {
            let stream = net::connect_implicit_tls(host, port).await?;
            let (reader, writer) = tokio::io::split(stream);
            Ok(Self::attach(reader, writer))
        } else {
            let stream = net::connect_plain(host, port).await?;
            let (reader, writer) = stream.into_split();
            Ok(Self::attach(reader, writer))
        }
    }

    /// Attach to an established transport (any AsyncRead/AsyncWrite pair)
    /// and start the pipeline task. The session starts in Connected.
    pub fn attach<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(SessionInner {
            registry: ResponseRegistry::new(),
            tags: TagAllocator::new(),
            state: Mutex::new(SessionState::Connected),
            capabilities: RwLock::new(Capability::new()),
            idle_tag: Mutex::new(None),
        });
        tokio::spawn(pipeline_loop(Arc::clone(&inner), reader, writer, outbound_rx));
        Self { inner, outbound_tx }
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.lock().unwrap()
    }

    /// Snapshot of the server capability set as last advertised.
    pub fn capabilities(&self) -> Capability {
        self.inner.capabilities.read().unwrap().clone()
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.inner.capabilities.read().unwrap().has_capability(name)
    }

    /// Issue a non-streaming command. Returns immediately with the handle
    /// that resolves once the terminal tagged response arrives.
    pub fn execute(&self, command: ImapCommand) -> Result<CompletionHandle, ImapError> {
        let (handle, _) = self.issue(command, false)?;
        Ok(handle)
    }

    /// Issue a streaming command (IDLE, streaming FETCH): untagged
    /// responses arrive on the returned stream in arrival order; the
    /// handle resolves when the stream ends.
    pub fn execute_streaming(
        &self,
        command: ImapCommand,
    ) -> Result<(CompletionHandle, UntaggedStream), ImapError> {
        let (handle, stream) = self.issue(command, true)?;
        Ok((handle, stream.expect("stream present for streaming command")))
    }

    /// Send the terminate line (DONE) of the outstanding IDLE command.
    pub fn done(&self) -> Result<(), ImapError> {
        let tag = match self.inner.idle_tag.lock().unwrap().clone() {
            Some(tag) => tag,
            None => {
                return Err(ImapError::StateViolation {
                    state: self.state(),
                    command: "DONE",
                })
            }
        };
        let line = self.inner.registry.terminate_line(&tag)?;
        self.outbound_tx
            .send(Outbound::Terminate { line })
            .map_err(|_| ImapError::ConnectionClosed("engine terminated".to_string()))
    }

    fn issue(
        &self,
        command: ImapCommand,
        streaming: bool,
    ) -> Result<(CompletionHandle, Option<UntaggedStream>), ImapError> {
        let mut command = command;
        let ct = command.command_type();
        let state = self.state();
        if !command_legal(state, ct) {
            command.cleanup();
            return Err(ImapError::StateViolation {
                state,
                command: ct.name(),
            });
        }
        if command.is_streaming() != streaming {
            command.cleanup();
            return Err(ImapError::UnsupportedOperation);
        }
        // Only one continuation-eligible command may be in flight: a
        // second one could not tell which `+` prompt is whose.
        if command.expects_continuation() && self.inner.registry.has_continuation_pending() {
            command.cleanup();
            return Err(ImapError::StateViolation {
                state,
                command: ct.name(),
            });
        }
        let caps = self.capabilities();
        let line = match command.encode(&caps) {
            Ok(line) => line,
            Err(e) => {
                command.cleanup();
                return Err(e);
            }
        };
        let sensitive = command.is_command_line_data_sensitive();
        let summary = command.debug_data();
        let tag = self.inner.tags.allocate();
        let (handle, stream) = self.inner.registry.register(&tag, command, streaming)?;
        {
            let mut st = self.inner.state.lock().unwrap();
            match ct {
                ImapCommandType::Login | ImapCommandType::Authenticate => {
                    *st = SessionState::Authenticating;
                }
                ImapCommandType::Idle => {
                    *st = SessionState::Idling;
                    *self.inner.idle_tag.lock().unwrap() = Some(tag.clone());
                }
                ImapCommandType::Logout => *st = SessionState::LoggingOut,
                _ => {}
            }
        }
        let send = self.outbound_tx.send(Outbound::Command {
            tag: tag.clone(),
            line,
            sensitive,
            summary,
        });
        if send.is_err() {
            self.inner
                .registry
                .fail(&tag, ImapError::ConnectionClosed("engine terminated".to_string()));
            return Err(ImapError::ConnectionClosed("engine terminated".to_string()));
        }
        Ok((handle, stream))
    }

    // Per-verb entry points.

    pub fn execute_capability(&self) -> Result<CompletionHandle, ImapError> {
        self.execute(ImapCommand::Capability)
    }

    pub fn execute_login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<CompletionHandle, ImapError> {
        self.execute(ImapCommand::Login(LoginCommand::new(username, password)))
    }

    pub fn execute_oauthbearer(
        &self,
        email: impl Into<String>,
        hostname: impl Into<String>,
        port: u16,
        token: impl Into<String>,
    ) -> Result<CompletionHandle, ImapError> {
        let caps = self.capabilities();
        self.execute(ImapCommand::AuthOauthBearer(AuthOauthBearerCommand::new(
            email, hostname, port, token, &caps,
        )))
    }

    pub fn execute_xoauth2(
        &self,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<CompletionHandle, ImapError> {
        let caps = self.capabilities();
        self.execute(ImapCommand::AuthXOauth2(AuthXOauth2Command::new(
            email, token, &caps,
        )))
    }

    pub fn execute_select(&self, mailbox: impl Into<String>) -> Result<CompletionHandle, ImapError> {
        self.execute(ImapCommand::Select(SelectCommand::new(mailbox)))
    }

    pub fn execute_status(
        &self,
        mailbox: impl Into<String>,
        items: &[&str],
    ) -> Result<CompletionHandle, ImapError> {
        self.execute(ImapCommand::Status(StatusCommand::new(
            mailbox,
            items.iter().copied(),
        )))
    }

    pub fn execute_create(&self, mailbox: impl Into<String>) -> Result<CompletionHandle, ImapError> {
        self.execute(ImapCommand::Create(CreateCommand::new(mailbox)))
    }

    pub fn execute_fetch(&self, fetch: FetchCommand) -> Result<CompletionHandle, ImapError> {
        self.execute(ImapCommand::Fetch(fetch))
    }

    pub fn execute_append(
        &self,
        mailbox: impl Into<String>,
        message: Vec<u8>,
    ) -> Result<CompletionHandle, ImapError> {
        self.execute(ImapCommand::Append(AppendCommand::new(mailbox, message)))
    }

    pub fn execute_idle(&self) -> Result<(CompletionHandle, UntaggedStream), ImapError> {
        self.execute_streaming(ImapCommand::Idle)
    }

    pub fn execute_noop(&self) -> Result<CompletionHandle, ImapError> {
        self.execute(ImapCommand::Noop)
    }

    pub fn execute_logout(&self) -> Result<CompletionHandle, ImapError> {
        self.execute(ImapCommand::Logout)
    }

    pub fn execute_raw(&self, line: impl Into<String>) -> Result<CompletionHandle, ImapError> {
        self.execute(ImapCommand::Raw(RawCommand::new(line)))
    }
}

async fn write_all_flush<W>(writer: &mut W, bufs: &[&[u8]]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for buf in bufs {
        writer.write_all(buf).await?;
    }
    writer.flush().await
}

/// One task owns the socket: writes queued command lines, reads and
/// classifies inbound frames, answers continuations, resolves tags.
async fn pipeline_loop<R, W>(
    inner: Arc<SessionInner>,
    mut reader: R,
    mut writer: W,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut acc = BytesMut::with_capacity(4096);
    let reason = 'outer: loop {
        // Drain complete frames before waiting for more I/O.
        while let Some((line, literal)) = take_frame(&mut acc) {
            trace!("<-- {}", line);
            match classify_line(line, literal) {
                Ok(resp) => {
                    if let Some(reason) = handle_response(&inner, &mut writer, resp).await {
                        break 'outer reason;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
        tokio::select! {
            maybe_out = outbound_rx.recv() => match maybe_out {
                Some(Outbound::Command { tag, line, sensitive, summary }) => {
                    if sensitive {
                        debug!("--> {} {}", tag, summary);
                    } else {
                        debug!("--> {} {}", tag, String::from_utf8_lossy(&line).trim_end());
                    }
                    if let Err(e) = write_all_flush(&mut writer, &[tag.as_bytes(), b" ", &line]).await {
                        break e.to_string();
                    }
                    inner.registry.mark_transmitted(&tag);
                }
                Some(Outbound::Terminate { line }) => {
                    debug!("--> {}", String::from_utf8_lossy(&line).trim_end());
                    if let Err(e) = write_all_flush(&mut writer, &[&line]).await {
                        break e.to_string();
                    }
                }
                None => break "session handle dropped".to_string(),
            },
            read = reader.read_buf(&mut acc) => match read {
                Ok(0) => break "connection closed by peer".to_string(),
                Ok(_) => {}
                Err(e) => break e.to_string(),
            },
        }
    };
    teardown(&inner, &reason);
}

fn teardown(inner: &SessionInner, reason: &str) {
    debug!("session teardown: {}", reason);
    *inner.state.lock().unwrap() = SessionState::Closed;
    inner.idle_tag.lock().unwrap().take();
    inner.registry.cancel_all(reason);
}

/// React to one classified response. Returns a teardown reason when the
/// session is over.
async fn handle_response<W>(
    inner: &Arc<SessionInner>,
    writer: &mut W,
    resp: ImapResponse,
) -> Option<String>
where
    W: AsyncWrite + Unpin,
{
    match resp {
        ImapResponse::Untagged(untagged) => {
            let upper = untagged.line.to_ascii_uppercase();
            if upper.starts_with("* CAPABILITY ") || upper.contains("[CAPABILITY ") {
                inner
                    .capabilities
                    .write()
                    .unwrap()
                    .replace_with(Capability::parse(&untagged.line));
            }
            if upper.starts_with("* PREAUTH") {
                let mut st = inner.state.lock().unwrap();
                if *st == SessionState::Connected {
                    *st = SessionState::Authenticated;
                }
            }
            if !inner.registry.dispatch_untagged(untagged) {
                trace!("unsolicited untagged response dropped");
            }
            None
        }
        ImapResponse::Continuation { prompt } => {
            match inner.registry.handle_continuation(&prompt) {
                Ok(Some((line, sensitive))) => {
                    if sensitive {
                        debug!("--> <continuation response redacted>");
                    } else {
                        debug!("--> {}", String::from_utf8_lossy(&line).trim_end());
                    }
                    if let Err(e) = write_all_flush(writer, &[&line]).await {
                        return Some(e.to_string());
                    }
                    None
                }
                Ok(None) => None,
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            }
        }
        ImapResponse::Tagged { tag, status, line } => {
            if line.to_ascii_uppercase().contains("[CAPABILITY ") {
                inner
                    .capabilities
                    .write()
                    .unwrap()
                    .replace_with(Capability::parse(&line));
            }
            // Transition before resolving so a caller waking on the
            // handle observes the post-completion state.
            let reason = inner
                .registry
                .command_type_of(&tag)
                .and_then(|ct| completion_transition(inner, ct, status, &tag));
            if let Err(e) = inner.registry.resolve(&tag, status, &line) {
                warn!("{}", e);
            }
            reason
        }
    }
}

/// State machine transitions driven by tagged completions.
fn completion_transition(
    inner: &SessionInner,
    command_type: ImapCommandType,
    status: ResponseStatus,
    tag: &str,
) -> Option<String> {
    let mut st = inner.state.lock().unwrap();
    match command_type {
        ImapCommandType::Login | ImapCommandType::Authenticate => {
            *st = if status.is_ok() {
                SessionState::Authenticated
            } else {
                SessionState::Connected
            };
            None
        }
        ImapCommandType::Select => {
            *st = if status.is_ok() {
                SessionState::Selected
            } else {
                SessionState::Authenticated
            };
            None
        }
        ImapCommandType::Idle => {
            let mut idle = inner.idle_tag.lock().unwrap();
            if idle.as_deref() == Some(tag) {
                *idle = None;
            }
            if *st == SessionState::Idling {
                *st = SessionState::Selected;
            }
            None
        }
        ImapCommandType::Logout => {
            *st = SessionState::Closed;
            Some("logged out".to_string())
        }
        _ => None,
    }
}
