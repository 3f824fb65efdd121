/*
 * mod.rs
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

//! Client command model. One closed enum over the supported verbs with a
//! flat contract: `encode` produces the wire line (tag excluded, CRLF
//! included) given the server capability set; `next_line` answers a `+`
//! continuation; `terminate_line` is the client-initiated terminator for
//! streaming commands (IDLE's DONE); `cleanup` scrubs credential material
//! after transmission. Encoding is pure: no I/O, no clock.

mod auth;
mod fetch;
mod folder;

pub use auth::{AuthOauthBearerCommand, AuthXOauth2Command, LoginCommand};
pub use fetch::{FetchCommand, FetchMacro};
pub use folder::{AppendCommand, CreateCommand, SelectCommand, StatusCommand};

use bytes::Bytes;

use crate::capability::{self, Capability};
use crate::error::ImapError;

pub(crate) const CRLF: &str = "\r\n";

/// Verb of a command, used for session state transitions and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImapCommandType {
    Login,
    Authenticate,
    Select,
    Status,
    Capability,
    Fetch,
    Create,
    Append,
    Idle,
    Noop,
    Logout,
    Raw,
}

impl ImapCommandType {
    pub fn name(&self) -> &'static str {
        match self {
            ImapCommandType::Login => "LOGIN",
            ImapCommandType::Authenticate => "AUTHENTICATE",
            ImapCommandType::Select => "SELECT",
            ImapCommandType::Status => "STATUS",
            ImapCommandType::Capability => "CAPABILITY",
            ImapCommandType::Fetch => "FETCH",
            ImapCommandType::Create => "CREATE",
            ImapCommandType::Append => "APPEND",
            ImapCommandType::Idle => "IDLE",
            ImapCommandType::Noop => "NOOP",
            ImapCommandType::Logout => "LOGOUT",
            ImapCommandType::Raw => "RAW",
        }
    }
}

/// Raw pass-through line, sent verbatim under a normal tag.
#[derive(Debug, Clone)]
pub struct RawCommand {
    line: String,
}

impl RawCommand {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }
}

/// A client command. Construct the variant, hand it to the session; the
/// session allocates the tag and drives continuation and cleanup.
#[derive(Debug)]
pub enum ImapCommand {
    Login(LoginCommand),
    AuthOauthBearer(AuthOauthBearerCommand),
    AuthXOauth2(AuthXOauth2Command),
    Select(SelectCommand),
    Status(StatusCommand),
    Capability,
    Fetch(FetchCommand),
    Create(CreateCommand),
    Append(AppendCommand),
    Idle,
    Noop,
    Logout,
    Raw(RawCommand),
}

impl ImapCommand {
    pub fn command_type(&self) -> ImapCommandType {
        match self {
            ImapCommand::Login(_) => ImapCommandType::Login,
            ImapCommand::AuthOauthBearer(_) | ImapCommand::AuthXOauth2(_) => {
                ImapCommandType::Authenticate
            }
            ImapCommand::Select(_) => ImapCommandType::Select,
            ImapCommand::Status(_) => ImapCommandType::Status,
            ImapCommand::Capability => ImapCommandType::Capability,
            ImapCommand::Fetch(_) => ImapCommandType::Fetch,
            ImapCommand::Create(_) => ImapCommandType::Create,
            ImapCommand::Append(_) => ImapCommandType::Append,
            ImapCommand::Idle => ImapCommandType::Idle,
            ImapCommand::Noop => ImapCommandType::Noop,
            ImapCommand::Logout => ImapCommandType::Logout,
            ImapCommand::Raw(_) => ImapCommandType::Raw,
        }
    }

    /// Encode the initial wire line (without tag, with CRLF). Fails with
    /// `CapabilityMissing` when the server lacks a required capability.
    pub fn encode(&self, caps: &Capability) -> Result<Bytes, ImapError> {
        match self {
            ImapCommand::Login(c) => c.encode(),
            ImapCommand::AuthOauthBearer(c) => c.encode(caps),
            ImapCommand::AuthXOauth2(c) => c.encode(caps),
            ImapCommand::Select(c) => c.encode(),
            ImapCommand::Status(c) => c.encode(),
            ImapCommand::Capability => Ok(Bytes::from_static(b"CAPABILITY\r\n")),
            ImapCommand::Fetch(c) => c.encode(),
            ImapCommand::Create(c) => c.encode(),
            ImapCommand::Append(c) => c.encode(),
            ImapCommand::Idle => {
                if !caps.has_capability(capability::IDLE) {
                    return Err(ImapError::CapabilityMissing(capability::IDLE.to_string()));
                }
                Ok(Bytes::from_static(b"IDLE\r\n"))
            }
            ImapCommand::Noop => Ok(Bytes::from_static(b"NOOP\r\n")),
            ImapCommand::Logout => Ok(Bytes::from_static(b"LOGOUT\r\n")),
            ImapCommand::Raw(c) => Ok(Bytes::from(format!("{}{}", c.line, CRLF))),
        }
    }

    /// True when the initial line defers a payload that the server will
    /// request with a `+` continuation (deferred SASL response, APPEND
    /// literal body).
    pub fn expects_continuation(&self) -> bool {
        match self {
            ImapCommand::AuthOauthBearer(c) => c.expects_continuation(),
            ImapCommand::AuthXOauth2(c) => c.expects_continuation(),
            ImapCommand::Append(_) => true,
            _ => false,
        }
    }

    /// Produce the next wire line in answer to a server `+` challenge.
    /// Commands that never defer a payload, and SASL commands that already
    /// responded inline, fail with `UnsupportedOperation`.
    pub fn next_line(&self, challenge: &str) -> Result<Bytes, ImapError> {
        match self {
            ImapCommand::AuthOauthBearer(c) => c.next_line(challenge),
            ImapCommand::AuthXOauth2(c) => c.next_line(challenge),
            ImapCommand::Append(c) => c.next_line(),
            _ => Err(ImapError::UnsupportedOperation),
        }
    }

    /// Client-initiated terminator. Only IDLE has one.
    pub fn terminate_line(&self) -> Result<Bytes, ImapError> {
        match self {
            ImapCommand::Idle => Ok(Bytes::from_static(b"DONE\r\n")),
            _ => Err(ImapError::UnsupportedOperation),
        }
    }

    /// True for commands whose untagged responses are forwarded live to
    /// the caller instead of buffered until completion.
    pub fn is_streaming(&self) -> bool {
        match self {
            ImapCommand::Idle => true,
            ImapCommand::Fetch(c) => c.is_streaming(),
            _ => false,
        }
    }

    /// True when the wire line carries credential material that must not
    /// be logged verbatim.
    pub fn is_command_line_data_sensitive(&self) -> bool {
        matches!(
            self,
            ImapCommand::Login(_) | ImapCommand::AuthOauthBearer(_) | ImapCommand::AuthXOauth2(_)
        )
    }

    /// Safe log form. For sensitive commands this names the user, never
    /// the credential.
    pub fn debug_data(&self) -> String {
        match self {
            ImapCommand::Login(c) => c.debug_data(),
            ImapCommand::AuthOauthBearer(c) => c.debug_data(),
            ImapCommand::AuthXOauth2(c) => c.debug_data(),
            other => other.command_type().name().to_string(),
        }
    }

    /// Scrub credential-bearing and bulky owned fields. The session calls
    /// this exactly once per command, on every exit path.
    pub fn cleanup(&mut self) {
        match self {
            ImapCommand::Login(c) => c.cleanup(),
            ImapCommand::AuthOauthBearer(c) => c.cleanup(),
            ImapCommand::AuthXOauth2(c) => c.cleanup(),
            ImapCommand::Select(c) => c.cleanup(),
            ImapCommand::Status(c) => c.cleanup(),
            ImapCommand::Fetch(c) => c.cleanup(),
            ImapCommand::Create(c) => c.cleanup(),
            ImapCommand::Append(c) => c.cleanup(),
            ImapCommand::Raw(c) => c.line = String::new(),
            ImapCommand::Capability
            | ImapCommand::Idle
            | ImapCommand::Noop
            | ImapCommand::Logout => {}
        }
    }
}
