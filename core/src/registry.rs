/*
 * registry.rs
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

//! Tag allocation and correlation of tagged server responses back to the
//! issuing command. The registry is the engine's single synchronization
//! point: register/resolve/cancel are atomic with respect to each other,
//! and a tag is registered before its bytes can reach the wire. Entries
//! keep arrival order so untagged data is attributed to the oldest
//! outstanding command, per the RFC 3501 pipelining rules.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::command::{ImapCommand, ImapCommandType};
use crate::error::ImapError;
use crate::response::{CommandCompletion, ResponseStatus, UntaggedResponse};

/// Hands out tags unique within the session. Reset only on reconnect.
#[derive(Debug, Default)]
pub struct TagAllocator {
    counter: AtomicU32,
}

impl TagAllocator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
        }
    }

    pub fn allocate(&self) -> String {
        format!("A{:04}", self.counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn reset(&self) {
        self.counter.store(0, Ordering::Relaxed);
    }
}

/// Continuation progress of one outstanding command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContinuationState {
    /// Initial line not yet on the wire.
    AwaitingInitial,
    /// Initial line sent with a deferred payload; a `+` prompt is expected.
    AwaitingContinuation,
    /// Fully transmitted; only the tagged completion remains.
    Terminal,
}

/// Caller-visible handle for one issued command, resolved exactly once.
#[derive(Debug)]
pub struct CompletionHandle {
    rx: oneshot::Receiver<Result<CommandCompletion, ImapError>>,
}

impl CompletionHandle {
    /// Wait for the terminal tagged response (plus buffered untagged data)
    /// or the failure that ended the command.
    pub async fn wait(self) -> Result<CommandCompletion, ImapError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(ImapError::ConnectionClosed("engine terminated".to_string())),
        }
    }
}

/// Live stream of untagged responses for a streaming command. Ends when
/// the tagged completion (or a failure) arrives; not restartable.
pub type UntaggedStream = mpsc::UnboundedReceiver<UntaggedResponse>;

/// One outstanding command: the command itself (still needed for
/// continuation lines and cleanup), its continuation state, buffered or
/// forwarded untagged data, and the completion sender.
pub(crate) struct PendingCommand {
    command: ImapCommand,
    state: ContinuationState,
    buffered: Vec<UntaggedResponse>,
    completion: Option<oneshot::Sender<Result<CommandCompletion, ImapError>>>,
    stream: Option<mpsc::UnboundedSender<UntaggedResponse>>,
    cleaned: bool,
}

impl PendingCommand {
    fn new(
        command: ImapCommand,
        completion: oneshot::Sender<Result<CommandCompletion, ImapError>>,
        stream: Option<mpsc::UnboundedSender<UntaggedResponse>>,
    ) -> Self {
        Self {
            command,
            state: ContinuationState::AwaitingInitial,
            buffered: Vec::new(),
            completion: Some(completion),
            stream,
            cleaned: false,
        }
    }

    fn scrub(&mut self) {
        if !self.cleaned {
            self.command.cleanup();
            self.cleaned = true;
        }
    }

    fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }
}

// Scrubbing and resolution must happen on every exit path, including
// teardown paths that never reach an explicit resolve.
impl Drop for PendingCommand {
    fn drop(&mut self) {
        self.scrub();
        if let Some(tx) = self.completion.take() {
            let _ = tx.send(Err(ImapError::ConnectionClosed(
                "command abandoned".to_string(),
            )));
        }
    }
}

/// Maps outstanding tags to pending commands. Never exposes the raw map;
/// all access goes through register/resolve/cancel-style operations.
#[derive(Default)]
pub struct ResponseRegistry {
    inner: Mutex<VecDeque<(String, PendingCommand)>>,
}

impl ResponseRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Register a command under its tag and hand back the caller's
    /// completion handle (plus the live stream for streaming commands).
    /// A duplicate tag is a programming error surfaced as a violation.
    pub(crate) fn register(
        &self,
        tag: &str,
        command: ImapCommand,
        streaming: bool,
    ) -> Result<(CompletionHandle, Option<UntaggedStream>), ImapError> {
        let mut command = command;
        let mut inner = self.inner.lock().unwrap();
        if inner.iter().any(|(t, _)| t == tag) {
            command.cleanup();
            return Err(ImapError::ProtocolViolation(format!(
                "tag {} already registered",
                tag
            )));
        }
        let (tx, rx) = oneshot::channel();
        let (stream_tx, stream_rx) = if streaming {
            let (s, r) = mpsc::unbounded_channel();
            (Some(s), Some(r))
        } else {
            (None, None)
        };
        inner.push_back((tag.to_string(), PendingCommand::new(command, tx, stream_tx)));
        Ok((CompletionHandle { rx }, stream_rx))
    }

    /// Mark a command's initial line as fully written. Commands with a
    /// deferred payload start waiting for the server prompt; everything
    /// else is terminal and gets scrubbed now.
    pub(crate) fn mark_transmitted(&self, tag: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some((_, pending)) = inner.iter_mut().find(|(t, _)| t == tag) {
            if pending.state == ContinuationState::AwaitingInitial {
                if pending.command.expects_continuation() {
                    pending.state = ContinuationState::AwaitingContinuation;
                } else {
                    pending.state = ContinuationState::Terminal;
                    pending.scrub();
                }
            }
        }
    }

    /// Route one untagged response to the oldest outstanding command:
    /// forwarded live for a streaming command, buffered otherwise. With
    /// nothing outstanding the line is unsolicited and dropped here
    /// (logged by the caller).
    pub(crate) fn dispatch_untagged(&self, resp: UntaggedResponse) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.front_mut() {
            Some((_, pending)) => {
                match &pending.stream {
                    Some(tx) => {
                        let _ = tx.send(resp);
                    }
                    None => pending.buffered.push(resp),
                }
                true
            }
            None => false,
        }
    }

    /// Answer a `+` prompt: the single command in AwaitingContinuation
    /// supplies its next line (and is terminal afterwards). Returns the
    /// line to write plus its sensitivity. If the waiting command cannot
    /// produce a line, the whole command fails instead of putting
    /// malformed bytes on the wire. A `+` with a streaming command
    /// outstanding is its acknowledgement and needs no reply; a `+` with
    /// nothing eligible is a protocol violation.
    pub(crate) fn handle_continuation(
        &self,
        challenge: &str,
    ) -> Result<Option<(Bytes, bool)>, ImapError> {
        let mut inner = self.inner.lock().unwrap();
        let pos = inner
            .iter()
            .position(|(_, p)| p.state == ContinuationState::AwaitingContinuation);
        let pos = match pos {
            Some(pos) => pos,
            None => {
                if inner.iter().any(|(_, p)| p.is_streaming()) {
                    return Ok(None);
                }
                return Err(ImapError::ProtocolViolation(
                    "continuation request with no command awaiting one".to_string(),
                ));
            }
        };
        let pending = &mut inner[pos].1;
        match pending.command.next_line(challenge) {
            Ok(line) => {
                let sensitive = pending.command.is_command_line_data_sensitive();
                pending.state = ContinuationState::Terminal;
                pending.scrub();
                Ok(Some((line, sensitive)))
            }
            Err(e) => {
                let (_, mut pending) = inner.remove(pos).expect("indexed entry");
                pending.scrub();
                if let Some(tx) = pending.completion.take() {
                    let _ = tx.send(Err(e));
                }
                Ok(None)
            }
        }
    }

    /// Verb of the outstanding command registered under `tag`, if any.
    pub(crate) fn command_type_of(&self, tag: &str) -> Option<ImapCommandType> {
        let inner = self.inner.lock().unwrap();
        inner
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, p)| p.command.command_type())
    }

    /// Terminate line for the streaming command registered under `tag`
    /// (IDLE's DONE).
    pub(crate) fn terminate_line(&self, tag: &str) -> Result<Bytes, ImapError> {
        let inner = self.inner.lock().unwrap();
        match inner.iter().find(|(t, _)| t == tag) {
            Some((_, pending)) => pending.command.terminate_line(),
            None => Err(ImapError::ProtocolViolation(format!(
                "no outstanding command for tag {}",
                tag
            ))),
        }
    }

    /// Complete the command registered under `tag` with its terminal
    /// response and whatever untagged data was buffered for it. Resolving
    /// a tag the client never issued is a protocol violation; all other
    /// entries are left untouched.
    pub(crate) fn resolve(
        &self,
        tag: &str,
        status: ResponseStatus,
        line: &str,
    ) -> Result<ImapCommandType, ImapError> {
        let mut inner = self.inner.lock().unwrap();
        let pos = inner.iter().position(|(t, _)| t == tag).ok_or_else(|| {
            ImapError::ProtocolViolation(format!("tagged response for unknown tag {}", tag))
        })?;
        let (_, mut pending) = inner.remove(pos).expect("indexed entry");
        drop(inner);
        let command_type = pending.command.command_type();
        pending.scrub();
        if let Some(tx) = pending.completion.take() {
            let _ = tx.send(Ok(CommandCompletion {
                tag: tag.to_string(),
                status,
                line: line.to_string(),
                untagged: std::mem::take(&mut pending.buffered),
            }));
        }
        Ok(command_type)
    }

    /// Fail one outstanding command (local failure after registration).
    pub(crate) fn fail(&self, tag: &str, err: ImapError) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(pos) = inner.iter().position(|(t, _)| t == tag) {
            let (_, mut pending) = inner.remove(pos).expect("indexed entry");
            pending.scrub();
            if let Some(tx) = pending.completion.take() {
                let _ = tx.send(Err(err));
            }
        }
    }

    /// True while some command still owes the server a continuation
    /// response. Only one such command may be outstanding at a time.
    pub(crate) fn has_continuation_pending(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.iter().any(|(_, p)| {
            p.state == ContinuationState::AwaitingContinuation
                || (p.state == ContinuationState::AwaitingInitial
                    && p.command.expects_continuation())
        })
    }

    /// Transport teardown: fail every outstanding command with
    /// ConnectionClosed and leave the registry empty. The only bulk
    /// operation.
    pub fn cancel_all(&self, reason: &str) {
        let drained: Vec<(String, PendingCommand)> = {
            let mut inner = self.inner.lock().unwrap();
            inner.drain(..).collect()
        };
        for (_, mut pending) in drained {
            pending.scrub();
            if let Some(tx) = pending.completion.take() {
                let _ = tx.send(Err(ImapError::ConnectionClosed(reason.to_string())));
            }
        }
    }

    pub fn outstanding(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}
